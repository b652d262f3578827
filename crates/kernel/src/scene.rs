use glam::Vec2;
use sidescroll_common::{SectionIndex, SimTime, StableKey};
use sidescroll_entities::{EntityLifecycleManager, FactoryRegistry};
use sidescroll_input::InputState;
use sidescroll_level::LevelDescription;
use sidescroll_player::{BodyState, DamageOutcome, PlayerEvent, PlayerIntent, PlayerMachine, PlayerState};
use sidescroll_pool::{BulletPool, Bounds, ParticlePool, PoolHandle};
use sidescroll_stream::{StreamController, StreamUpdate, TileMap};
use std::sync::Arc;
use std::time::Duration;

use crate::bus::{EventBus, GameEvent};
use crate::config::{ConfigError, SceneConfig};
use crate::store::{GameAction, GameState, GameStatus, GameStore};

/// What happened during one [`Scene::step`].
#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub tick: u64,
    pub intent: PlayerIntent,
    pub stream: StreamUpdate,
    /// Set when the player was respawned this tick; the body belongs here.
    pub respawn_at: Option<Vec2>,
    pub bullets_released: usize,
    pub game_over: bool,
}

/// A running level: streaming, player state, pools and the event bus,
/// advanced one tick at a time by the embedding game.
///
/// `C` is the context handed to entity factories.
pub struct Scene<C> {
    config: SceneConfig,
    level: Arc<LevelDescription>,
    stream: StreamController<C>,
    tiles: TileMap,
    player: PlayerMachine,
    bullets: BulletPool,
    particles: ParticlePool,
    bus: EventBus,
    store: GameStore,
    spawn_point: Vec2,
    now: SimTime,
    tick: u64,
    died_at: Option<SimTime>,
}

impl<C> Scene<C> {
    pub fn new(
        config: SceneConfig,
        level: Arc<LevelDescription>,
        registry: FactoryRegistry<C>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let spawn_point = level.player_start().unwrap_or_else(|| {
            tracing::warn!(
                x = config.world.fallback_spawn.x,
                y = config.world.fallback_spawn.y,
                "level has no PlayerStart; using fallback spawn"
            );
            config.world.fallback_spawn
        });

        let entities = EntityLifecycleManager::new(Arc::clone(&level), registry, config.lifecycle.clone());
        let stream = StreamController::new(config.stream.clone(), Arc::clone(&level), entities);

        tracing::info!(
            sub_levels = level.len(),
            world_width = level.world_width(),
            sections = stream.grid().max_section() + 1,
            "scene created"
        );

        let initial = GameState {
            status: GameStatus::Playing,
            ..GameState::new(config.player.lives, config.player.max_health, config.player.max_stamina)
        };

        Ok(Self {
            store: GameStore::new(initial, config.world.state_history),
            player: PlayerMachine::new(config.player.clone()),
            bullets: BulletPool::new(&config.pools),
            particles: ParticlePool::new(&config.pools),
            tiles: TileMap::new(),
            bus: EventBus::new(),
            config,
            level,
            stream,
            spawn_point,
            now: SimTime::ZERO,
            tick: 0,
            died_at: None,
        })
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn level(&self) -> &Arc<LevelDescription> {
        &self.level
    }

    pub fn stream(&self) -> &StreamController<C> {
        &self.stream
    }

    pub fn tiles(&self) -> &TileMap {
        &self.tiles
    }

    pub fn player(&self) -> &PlayerMachine {
        &self.player
    }

    pub fn bullets(&self) -> &BulletPool {
        &self.bullets
    }

    pub fn bullets_mut(&mut self) -> &mut BulletPool {
        &mut self.bullets
    }

    pub fn particles(&self) -> &ParticlePool {
        &self.particles
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn spawn_point(&self) -> Vec2 {
        self.spawn_point
    }

    pub fn store(&self) -> &GameStore {
        &self.store
    }

    /// Where the next respawn places the player.
    pub fn respawn_point(&self) -> Vec2 {
        self.store.state().checkpoint.unwrap_or(self.spawn_point)
    }

    /// Apply a game-state change and publish it when it took effect.
    pub fn dispatch(&mut self, action: GameAction) -> bool {
        let changed = self.store.dispatch(action, self.now);
        if changed {
            self.bus.publish(GameEvent::StateChanged { action });
        }
        changed
    }

    /// Record `position` as the respawn point from now on.
    pub fn reach_checkpoint(&mut self, position: Vec2) -> bool {
        tracing::debug!(x = position.x, y = position.y, "checkpoint reached");
        self.dispatch(GameAction::ReachCheckpoint(position))
    }

    pub fn now(&self) -> SimTime {
        self.now
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// The level rectangle bullets are confined to.
    pub fn world_bounds(&self) -> Bounds {
        Bounds::new(
            Vec2::ZERO,
            Vec2::new(self.level.world_width(), self.level.world_height()),
        )
    }

    /// Advance one tick. `body` is the physics engine's view of the player
    /// after the previous tick; the returned intent is applied before the next.
    pub fn step(&mut self, dt: Duration, input: &InputState, body: BodyState, ctx: &mut C) -> StepReport {
        self.tick += 1;
        self.now += dt;
        let now = self.now;

        let fall_limit = self.level.world_height() + self.config.world.fall_margin;
        if !self.player.is_dying() && body.position.y > fall_limit {
            let outcome = self.player.fall_out(now);
            tracing::debug!(y = body.position.y, ?outcome, "player fell out of the world");
        }

        let intent = self.player.tick(input, body, now, dt);

        if let Some(facing) = intent.shot {
            let origin = body.position;
            if self.bullets.fire(origin, facing).is_some() {
                self.bus.publish(GameEvent::BulletFired { origin, facing });
            }
        }

        let stream = self.stream.update(body.position.x, &mut self.tiles, ctx);
        for &section in &stream.loaded {
            self.bus.publish(GameEvent::SectionLoaded { section });
        }
        for &section in &stream.unloaded {
            self.bus.publish(GameEvent::SectionUnloaded { section });
        }

        let secs = dt.as_secs_f32();
        let bounds = self.world_bounds();
        let bullets_released = self.bullets.update(secs, bounds);
        self.particles.update(secs);

        let mut respawn_at = None;
        if self.player.is_dying() && !self.player.is_game_over() {
            let died_at = *self.died_at.get_or_insert(now);
            let delay = Duration::from_millis(self.config.world.respawn_delay_ms);
            if now.since(died_at) >= delay && self.player.respawn(now) {
                self.died_at = None;
                respawn_at = Some(self.respawn_point());
                self.stream.force_refresh();
            }
        }
        self.forward_player_events();
        self.dispatch(GameAction::SetPlayerState(self.player.state()));

        tracing::trace!(
            tick = self.tick,
            state = ?intent.state,
            bullets = self.bullets.active_count(),
            particles = self.particles.active_count(),
            "scene step"
        );

        StepReport {
            tick: self.tick,
            intent,
            stream,
            respawn_at,
            bullets_released,
            game_over: self.player.is_game_over(),
        }
    }

    /// Apply one contact hit to the player.
    pub fn hit_player(&mut self) -> DamageOutcome {
        let outcome = self.player.take_damage(self.now);
        self.forward_player_events();
        outcome
    }

    /// Remove a live entity, e.g. when gameplay destroys it.
    pub fn despawn_entity(&mut self, key: StableKey) -> bool {
        let removed = self.stream.entities_mut().despawn(key);
        if removed {
            self.bus.publish(GameEvent::EntityDespawned { key });
        }
        removed
    }

    /// Emit a particle burst, e.g. where a bullet hit.
    pub fn spawn_effect(&mut self, center: Vec2, color: u32, count: usize) -> Vec<PoolHandle> {
        self.particles.burst(center, color, count)
    }

    /// Unload everything and restore the player to a fresh state. The clock
    /// keeps running.
    pub fn reset(&mut self) {
        for section in self.stream.reset(&mut self.tiles) {
            self.bus.publish(GameEvent::SectionUnloaded { section });
        }
        let stale = self.stream.entities_mut().clear();
        let bullets = self.bullets.clear();
        let particles = self.particles.clear();
        self.player = PlayerMachine::new(self.config.player.clone());
        self.died_at = None;
        self.store.reset();
        tracing::debug!(stale, bullets, particles, "scene reset");
        self.bus.publish(GameEvent::LevelReset);
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            tick: self.tick,
            time_ms: self.now.as_millis(),
            resident: self.stream.resident().iter().copied().collect(),
            tiles: self.tiles.len(),
            live_entities: self.stream.entities().live_count(),
            bullets: self.bullets.active_count(),
            particles: self.particles.active_count(),
            player_state: self.player.state(),
            health: self.player.health(),
            lives: self.player.lives(),
            stamina: self.player.stamina(),
            score: self.store.state().score,
            avg_update: self.stream.history().average(),
        }
    }

    fn forward_player_events(&mut self) {
        for event in self.player.drain_events() {
            self.bus.publish(GameEvent::Player(event));
            match event {
                PlayerEvent::HealthChanged { health } => {
                    self.dispatch(GameAction::SetHealth(health));
                }
                PlayerEvent::StaminaChanged { stamina } => {
                    self.dispatch(GameAction::SetStamina(stamina));
                }
                PlayerEvent::Died { lives } => {
                    self.dispatch(GameAction::SetLives(lives));
                }
                PlayerEvent::GameOver => {
                    self.dispatch(GameAction::SetLives(0));
                    self.dispatch(GameAction::SetStatus(GameStatus::GameOver));
                }
                _ => {}
            }
        }
    }
}

/// Point-in-time snapshot of a scene for tooling output.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneSummary {
    pub tick: u64,
    pub time_ms: u128,
    pub resident: Vec<SectionIndex>,
    pub tiles: usize,
    pub live_entities: usize,
    pub bullets: usize,
    pub particles: usize,
    pub player_state: PlayerState,
    pub health: u32,
    pub lives: u32,
    pub stamina: f32,
    pub score: u64,
    pub avg_update: Duration,
}

impl std::fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Scene: tick={} t={}ms sections={:?} tiles={} entities={} bullets={} particles={} \
             player={:?} hp={} lives={} stamina={:.1} score={} avg_update={:?}",
            self.tick,
            self.time_ms,
            self.resident,
            self.tiles,
            self.live_entities,
            self.bullets,
            self.particles,
            self.player_state,
            self.health,
            self.lives,
            self.stamina,
            self.score,
            self.avg_update,
        )
    }
}
