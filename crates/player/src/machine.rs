use glam::Vec2;
use serde::{Deserialize, Serialize};
use sidescroll_common::{Facing, SimTime};
use sidescroll_input::{InputSignal, InputState};
use std::time::Duration;

use crate::config::PlayerConfig;

fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Externally visible substate, derived once per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    #[default]
    Idle,
    Walking,
    Jumping,
    Rolling,
    Hovering,
    Dying,
}

/// The stamina-consuming action in progress. Rolling and hovering share one
/// slot so they cannot both be active.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Action {
    None,
    Rolling {
        started: SimTime,
        charged: Duration,
        direction: Facing,
    },
    Hovering {
        started: SimTime,
        charged: Duration,
    },
}

/// What the physics body reports at the start of a tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
    pub blocked_left: bool,
    pub blocked_right: bool,
}

impl BodyState {
    pub fn grounded_at(position: Vec2) -> Self {
        Self {
            position,
            grounded: true,
            ..Self::default()
        }
    }

    pub fn airborne_at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }
}

/// Velocity writes and presentation hints produced by one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerIntent {
    pub velocity_x: f32,
    /// `None` leaves vertical velocity to gravity.
    pub velocity_y: Option<f32>,
    /// The body should stop moving entirely.
    pub frozen: bool,
    pub facing: Facing,
    pub state: PlayerState,
    pub jumped: bool,
    pub shot: Option<Facing>,
}

impl PlayerIntent {
    fn frozen(facing: Facing) -> Self {
        Self {
            velocity_x: 0.0,
            velocity_y: Some(0.0),
            frozen: true,
            facing,
            state: PlayerState::Dying,
            jumped: false,
            shot: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    /// Dying or invulnerable; nothing changed.
    Ignored,
    Damaged { health: u32 },
    /// Lost a life; `respawn` brings the player back.
    Died { lives: u32 },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PlayerEvent {
    HealthChanged { health: u32 },
    StaminaChanged { stamina: f32 },
    Jumped,
    Shot { facing: Facing },
    RollStarted,
    RollEnded,
    HoverStarted,
    HoverEnded,
    Died { lives: u32 },
    GameOver,
    Respawned,
}

/// Tick-driven player state: jump timing, roll and hover, stamina, health and lives.
///
/// Every guard failure is a no-op. Timers are stored as start timestamps and
/// compared against `now`; nothing is scheduled.
#[derive(Debug, Clone)]
pub struct PlayerMachine {
    config: PlayerConfig,
    health: u32,
    lives: u32,
    stamina: f32,
    last_stamina_use: Option<SimTime>,
    action: Action,
    jumping: bool,
    jumps_available: u32,
    last_grounded: Option<SimTime>,
    jump_pressed_at: Option<SimTime>,
    /// The press that triggered the last jump is still held.
    jump_hold_spent: bool,
    last_hover_end: Option<SimTime>,
    invulnerable_until: Option<SimTime>,
    dying: bool,
    facing: Facing,
    state: PlayerState,
    events: Vec<PlayerEvent>,
}

impl PlayerMachine {
    pub fn new(config: PlayerConfig) -> Self {
        Self {
            health: config.max_health,
            lives: config.lives,
            stamina: config.max_stamina,
            jumps_available: config.max_jumps,
            config,
            last_stamina_use: None,
            action: Action::None,
            jumping: false,
            last_grounded: None,
            jump_pressed_at: None,
            jump_hold_spent: false,
            last_hover_end: None,
            invulnerable_until: None,
            dying: false,
            facing: Facing::Right,
            state: PlayerState::Idle,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn lives(&self) -> u32 {
        self.lives
    }

    pub fn stamina(&self) -> f32 {
        self.stamina
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn facing(&self) -> Facing {
        self.facing
    }

    pub fn jumps_available(&self) -> u32 {
        self.jumps_available
    }

    pub fn is_rolling(&self) -> bool {
        matches!(self.action, Action::Rolling { .. })
    }

    pub fn is_hovering(&self) -> bool {
        matches!(self.action, Action::Hovering { .. })
    }

    pub fn is_jumping(&self) -> bool {
        self.jumping
    }

    pub fn is_dying(&self) -> bool {
        self.dying
    }

    pub fn is_game_over(&self) -> bool {
        self.dying && self.lives == 0
    }

    pub fn is_invulnerable(&self, now: SimTime) -> bool {
        self.invulnerable_until.is_some_and(|until| now < until)
    }

    /// Take every event recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Advance one tick.
    ///
    /// Order: regen, ground bookkeeping, wall cancel, roll, jump, hover,
    /// horizontal movement, shoot, substate.
    pub fn tick(&mut self, input: &InputState, body: BodyState, now: SimTime, dt: Duration) -> PlayerIntent {
        if self.dying {
            self.state = PlayerState::Dying;
            return PlayerIntent::frozen(self.facing);
        }
        let stamina_before = self.stamina;

        self.regenerate(body.grounded, now, dt);

        if body.grounded {
            self.last_grounded = Some(now);
            self.jumps_available = self.config.max_jumps;
        }

        let mut velocity_x = body.velocity.x;
        let mut velocity_y = None;

        let mut roll_ended = false;
        if self.is_rolling() && (body.blocked_left || body.blocked_right) {
            self.end_roll(now);
            roll_ended = true;
        }

        if let Action::Rolling {
            started,
            charged,
            direction,
        } = self.action
        {
            if !input.is_held(InputSignal::Roll) || self.stamina <= 0.0 {
                self.end_roll(now);
                roll_ended = true;
            } else {
                let elapsed = now.since(started);
                let cost = self.config.roll_drain.drain_between(charged, elapsed);
                self.spend(cost, now);
                if self.stamina > 0.0 {
                    self.action = Action::Rolling {
                        started,
                        charged: elapsed,
                        direction,
                    };
                    velocity_x = direction.sign() * self.config.roll_speed;
                } else {
                    self.end_roll(now);
                    roll_ended = true;
                }
            }
        }

        if !roll_ended
            && matches!(self.action, Action::None)
            && body.grounded
            && input.is_held(InputSignal::Roll)
            && self.stamina > 0.0
        {
            let direction = if input.is_held(InputSignal::Left) {
                Facing::Left
            } else if input.is_held(InputSignal::Right) {
                Facing::Right
            } else {
                self.facing
            };
            let blocked = match direction {
                Facing::Left => body.blocked_left,
                Facing::Right => body.blocked_right,
            };
            if !blocked {
                self.action = Action::Rolling {
                    started: now,
                    charged: Duration::ZERO,
                    direction,
                };
                self.facing = direction;
                self.last_stamina_use = Some(now);
                velocity_x = direction.sign() * self.config.roll_speed;
                tracing::debug!(?direction, stamina = self.stamina, "roll started");
                self.events.push(PlayerEvent::RollStarted);
            }
        }

        if input.just_pressed(InputSignal::Jump) {
            self.jump_pressed_at = Some(now);
        }
        if !input.is_held(InputSignal::Jump) {
            self.jump_hold_spent = false;
        }
        let in_coyote = self
            .last_grounded
            .is_some_and(|t| now.since(t) < ms(self.config.coyote_ms));
        let buffered = self
            .jump_pressed_at
            .is_some_and(|t| now.since(t) < ms(self.config.jump_buffer_ms));
        let mut jumped = false;
        if in_coyote && buffered && self.jumps_available > 0 && !self.jumping && !self.is_hovering() {
            self.jumping = true;
            self.jumps_available -= 1;
            self.jump_pressed_at = None;
            self.jump_hold_spent = true;
            velocity_y = Some(self.config.jump_speed);
            if self.is_rolling() {
                self.end_roll(now);
            }
            jumped = true;
            self.events.push(PlayerEvent::Jumped);
        }
        if body.grounded && !jumped {
            self.jumping = false;
        }

        let mut hover_ended = false;
        if let Action::Hovering { started, charged } = self.action {
            let elapsed = now.since(started);
            let max = ms(self.config.hover_max_ms);
            if body.grounded || !input.is_held(InputSignal::Jump) || self.stamina <= 0.0 {
                self.end_hover(now);
                hover_ended = true;
            } else {
                let cost = self.config.hover_drain.drain_between(charged, elapsed.min(max));
                self.spend(cost, now);
                if self.stamina > 0.0 && elapsed < max {
                    self.action = Action::Hovering {
                        started,
                        charged: elapsed,
                    };
                    velocity_y = Some(self.config.hover_force);
                } else {
                    self.end_hover(now);
                    hover_ended = true;
                }
            }
        }

        if !hover_ended
            && !jumped
            && matches!(self.action, Action::None)
            && !body.grounded
            && !self.jump_hold_spent
            && input.is_held(InputSignal::Jump)
            && input.held_for(InputSignal::Jump, now) >= ms(self.config.hover_hold_ms)
            && self
                .last_hover_end
                .is_none_or(|t| now.since(t) >= ms(self.config.hover_cooldown_ms))
            && self.stamina > 0.0
        {
            self.action = Action::Hovering {
                started: now,
                charged: Duration::ZERO,
            };
            self.last_stamina_use = Some(now);
            velocity_y = Some(self.config.hover_force);
            tracing::debug!(stamina = self.stamina, "hover started");
            self.events.push(PlayerEvent::HoverStarted);
        }

        if !self.is_rolling() {
            let hovering = self.is_hovering();
            let speed = if hovering {
                self.config.movement_speed * self.config.hover_air_control
            } else {
                self.config.movement_speed
            };
            if input.is_held(InputSignal::Left) {
                velocity_x = -speed;
                self.facing = Facing::Left;
            } else if input.is_held(InputSignal::Right) {
                velocity_x = speed;
                self.facing = Facing::Right;
            } else if hovering {
                velocity_x = body.velocity.x * self.config.hover_drift_damping;
            } else {
                velocity_x = 0.0;
            }
        }

        let shot = input.just_pressed(InputSignal::Shoot).then_some(self.facing);
        if let Some(facing) = shot {
            self.events.push(PlayerEvent::Shot { facing });
        }

        if self.stamina != stamina_before {
            self.events.push(PlayerEvent::StaminaChanged {
                stamina: self.stamina,
            });
        }

        self.state = match self.action {
            Action::Rolling { .. } => PlayerState::Rolling,
            Action::Hovering { .. } => PlayerState::Hovering,
            Action::None if jumped || !body.grounded => PlayerState::Jumping,
            Action::None if velocity_x != 0.0 => PlayerState::Walking,
            Action::None => PlayerState::Idle,
        };

        PlayerIntent {
            velocity_x,
            velocity_y,
            frozen: false,
            facing: self.facing,
            state: self.state,
            jumped,
            shot,
        }
    }

    /// Apply the configured damage amount.
    pub fn take_damage(&mut self, now: SimTime) -> DamageOutcome {
        self.take_damage_by(self.config.damage, now)
    }

    pub fn take_damage_by(&mut self, amount: u32, now: SimTime) -> DamageOutcome {
        if self.dying || self.is_invulnerable(now) {
            return DamageOutcome::Ignored;
        }
        self.health = self.health.saturating_sub(amount);
        self.events.push(PlayerEvent::HealthChanged {
            health: self.health,
        });
        if self.health == 0 {
            return self.die();
        }
        self.invulnerable_until = Some(now + ms(self.config.invulnerability_ms));
        DamageOutcome::Damaged {
            health: self.health,
        }
    }

    /// The player left the world through the bottom. Costs a life regardless
    /// of invulnerability.
    pub fn fall_out(&mut self, _now: SimTime) -> DamageOutcome {
        if self.dying {
            return DamageOutcome::Ignored;
        }
        self.health = 0;
        self.events.push(PlayerEvent::HealthChanged { health: 0 });
        self.die()
    }

    /// Leave `Dying` with full health and a fresh invulnerability window.
    /// Refused when not dying or when no lives remain.
    pub fn respawn(&mut self, now: SimTime) -> bool {
        if !self.dying || self.lives == 0 {
            return false;
        }
        self.dying = false;
        self.health = self.config.max_health;
        self.state = PlayerState::Idle;
        self.invulnerable_until = Some(now + ms(self.config.invulnerability_ms));
        self.last_grounded = None;
        self.jumps_available = self.config.max_jumps;
        tracing::debug!(lives = self.lives, "player respawned");
        self.events.push(PlayerEvent::HealthChanged {
            health: self.health,
        });
        self.events.push(PlayerEvent::Respawned);
        true
    }

    fn die(&mut self) -> DamageOutcome {
        self.dying = true;
        self.state = PlayerState::Dying;
        self.action = Action::None;
        self.jumping = false;
        self.jump_pressed_at = None;
        self.lives = self.lives.saturating_sub(1);
        tracing::debug!(lives = self.lives, "player died");
        if self.lives == 0 {
            self.events.push(PlayerEvent::GameOver);
            DamageOutcome::GameOver
        } else {
            self.events.push(PlayerEvent::Died { lives: self.lives });
            DamageOutcome::Died { lives: self.lives }
        }
    }

    fn regenerate(&mut self, grounded: bool, now: SimTime, dt: Duration) {
        if !matches!(self.action, Action::None) {
            return;
        }
        let rested = self
            .last_stamina_use
            .is_none_or(|t| now.since(t) >= ms(self.config.regen_delay_ms));
        if !rested {
            return;
        }
        let mut rate = self.config.stamina_regen;
        if grounded {
            rate += self.config.ground_regen_bonus;
        }
        self.stamina = (self.stamina + rate * dt.as_secs_f32()).min(self.config.max_stamina);
    }

    fn spend(&mut self, cost: f32, now: SimTime) {
        self.stamina = (self.stamina - cost).max(0.0);
        self.last_stamina_use = Some(now);
    }

    fn end_roll(&mut self, now: SimTime) {
        self.action = Action::None;
        self.last_stamina_use = Some(now);
        tracing::debug!(stamina = self.stamina, "roll ended");
        self.events.push(PlayerEvent::RollEnded);
    }

    fn end_hover(&mut self, now: SimTime) {
        self.action = Action::None;
        self.last_stamina_use = Some(now);
        self.last_hover_end = Some(now);
        tracing::debug!(stamina = self.stamina, "hover ended");
        self.events.push(PlayerEvent::HoverEnded);
    }
}
