use serde::{Deserialize, Serialize};
use sidescroll_common::{SectionGrid, SectionIndex};
use sidescroll_entities::EntityLifecycleManager;
use sidescroll_level::LevelDescription;
use std::collections::{BTreeSet, VecDeque};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::tiles::{TileLoader, TileSurface};

/// Streaming configuration: section size and the resident window around the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// Width of one section in world units. Fixed for the life of a controller.
    pub section_width: f32,
    /// Sections kept resident on each side of the player's section.
    pub buffer_sections: i32,
    /// Extra sections beyond the buffer tolerated before unloading.
    pub unload_slack: i32,
    /// Player movement below this distance skips the update.
    pub move_epsilon: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            section_width: 640.0,
            buffer_sections: 2,
            unload_slack: 0,
            move_epsilon: 0.5,
        }
    }
}

/// Sections that changed residency during one update, in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamUpdate {
    pub loaded: Vec<SectionIndex>,
    pub unloaded: Vec<SectionIndex>,
}

impl StreamUpdate {
    pub fn is_empty(&self) -> bool {
        self.loaded.is_empty() && self.unloaded.is_empty()
    }
}

/// Per-update streaming statistics for instrumentation.
#[derive(Debug, Clone, Default)]
pub struct StreamStats {
    pub sections_loaded: usize,
    pub sections_unloaded: usize,
    pub tiles_placed: usize,
    pub tiles_cleared: usize,
    pub entities_spawned: usize,
    pub entities_despawned: usize,
    pub resident_sections: usize,
    pub live_entities: usize,
    pub update_time: Duration,
    /// True when the update was skipped because the player barely moved.
    pub throttled: bool,
}

/// Rolling window of recent update durations.
#[derive(Debug, Clone)]
pub struct UpdateHistory {
    samples: VecDeque<Duration>,
    capacity: usize,
}

impl UpdateHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    pub fn record(&mut self, sample: Duration) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(sample);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn average(&self) -> Duration {
        if self.samples.is_empty() {
            return Duration::ZERO;
        }
        self.samples.iter().sum::<Duration>() / self.samples.len() as u32
    }

    pub fn max(&self) -> Duration {
        self.samples.iter().copied().max().unwrap_or(Duration::ZERO)
    }
}

/// Keeps the sections around the player resident and nothing else.
///
/// The resident set is only mutated here. A section is loaded tiles first,
/// then entities; it is unloaded entities first, then tiles.
pub struct StreamController<C> {
    config: StreamConfig,
    grid: SectionGrid,
    tiles: TileLoader,
    entities: EntityLifecycleManager<C>,
    resident: BTreeSet<SectionIndex>,
    last_x: Option<f32>,
    force_refresh: bool,
    stats: StreamStats,
    history: UpdateHistory,
}

impl<C> StreamController<C> {
    /// Panics if `config.section_width` is not positive; validate configs first.
    pub fn new(config: StreamConfig, level: Arc<LevelDescription>, entities: EntityLifecycleManager<C>) -> Self {
        let grid = SectionGrid::for_world(level.world_width(), config.section_width);
        tracing::debug!(
            section_width = config.section_width,
            max_section = grid.max_section(),
            "stream controller created"
        );
        Self {
            tiles: TileLoader::new(level, grid),
            config,
            grid,
            entities,
            resident: BTreeSet::new(),
            last_x: None,
            force_refresh: false,
            stats: StreamStats::default(),
            history: UpdateHistory::new(120),
        }
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    pub fn grid(&self) -> &SectionGrid {
        &self.grid
    }

    pub fn tiles(&self) -> &TileLoader {
        &self.tiles
    }

    pub fn entities(&self) -> &EntityLifecycleManager<C> {
        &self.entities
    }

    pub fn entities_mut(&mut self) -> &mut EntityLifecycleManager<C> {
        &mut self.entities
    }

    pub fn resident(&self) -> &BTreeSet<SectionIndex> {
        &self.resident
    }

    pub fn is_resident(&self, section: SectionIndex) -> bool {
        self.resident.contains(&section)
    }

    pub fn stats(&self) -> &StreamStats {
        &self.stats
    }

    pub fn history(&self) -> &UpdateHistory {
        &self.history
    }

    /// Make the next update run even if the player has not moved.
    pub fn force_refresh(&mut self) {
        self.force_refresh = true;
    }

    /// Bring the resident set in line with the window around `player_x`.
    pub fn update(&mut self, player_x: f32, surface: &mut dyn TileSurface, ctx: &mut C) -> StreamUpdate {
        let _span = tracing::info_span!("stream_update", player_x).entered();

        if !self.force_refresh
            && self
                .last_x
                .is_some_and(|last| (player_x - last).abs() < self.config.move_epsilon)
        {
            self.stats.throttled = true;
            self.stats.sections_loaded = 0;
            self.stats.sections_unloaded = 0;
            return StreamUpdate::default();
        }
        self.force_refresh = false;
        self.last_x = Some(player_x);

        let start = Instant::now();
        let own = self.grid.clamped_section_of(player_x);
        let desired = self.grid.window_around(own, self.config.buffer_sections);
        let keep_distance = self.config.buffer_sections + self.config.unload_slack;

        let mut stats = StreamStats::default();
        let mut update = StreamUpdate::default();

        for &section in desired.difference(&self.resident) {
            stats.tiles_placed += self.tiles.load_section(section, surface);
            let range = self.grid.world_range(section);
            stats.entities_spawned += self.entities.load_section_entities(section, range, ctx);
            update.loaded.push(section);
        }
        self.resident.extend(update.loaded.iter().copied());

        let far: Vec<SectionIndex> = self
            .resident
            .iter()
            .copied()
            .filter(|&s| s != own && SectionGrid::distance(s, own) > keep_distance)
            .collect();
        for section in far {
            stats.entities_despawned += self.entities.unload_section_entities(section);
            stats.tiles_cleared += self.tiles.unload_section(section, surface);
            self.resident.remove(&section);
            update.unloaded.push(section);
        }

        stats.sections_loaded = update.loaded.len();
        stats.sections_unloaded = update.unloaded.len();
        stats.resident_sections = self.resident.len();
        stats.live_entities = self.entities.live_count();
        stats.update_time = start.elapsed();
        self.history.record(stats.update_time);

        tracing::trace!(
            own,
            loaded = stats.sections_loaded,
            unloaded = stats.sections_unloaded,
            resident = stats.resident_sections,
            live = stats.live_entities,
            "stream update complete"
        );
        self.stats = stats;
        update
    }

    /// Unload every resident section. Returns the sections unloaded.
    pub fn reset(&mut self, surface: &mut dyn TileSurface) -> Vec<SectionIndex> {
        let sections: Vec<SectionIndex> = self.resident.iter().copied().collect();
        for &section in &sections {
            self.entities.unload_section_entities(section);
            self.tiles.unload_section(section, surface);
        }
        self.resident.clear();
        self.last_x = None;
        tracing::debug!(unloaded = sections.len(), "stream controller reset");
        sections
    }
}
