//! Level description: the read-only, pre-parsed world document.
//!
//! A level is a sequence of sub-levels placed along the world x axis. Each
//! sub-level carries a solid (IntGrid) layer and an entity layer.
//!
//! # Invariants
//! - The document is immutable once constructed; consumers share it by `Arc`.
//! - Sub-level origins are computed once, in document order.

mod model;

pub use model::{
    AutoTile, DEFAULT_GRID_SIZE, ENTITIES_LAYER, EntityDef, FieldInstance, LayerInstance,
    LayerType, SOLID_LAYER, SubLevel,
};

use glam::Vec2;
use serde::Deserialize;
use std::ops::Range;
use std::path::Path;

/// Errors from building or loading a level description.
#[derive(Debug, thiserror::Error)]
pub enum LevelError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("level description contains no sub-levels")]
    NoSubLevels,
}

#[derive(Deserialize)]
struct RawLevelDescription {
    levels: Vec<SubLevel>,
}

/// The full world document with resolved sub-level origins.
#[derive(Debug, Clone)]
pub struct LevelDescription {
    levels: Vec<SubLevel>,
    origins: Vec<f32>,
}

impl LevelDescription {
    /// Build a description from sub-levels, resolving their world x origins.
    pub fn from_sub_levels(levels: Vec<SubLevel>) -> Result<Self, LevelError> {
        if levels.is_empty() {
            return Err(LevelError::NoSubLevels);
        }
        let mut origins = Vec::with_capacity(levels.len());
        let mut cursor = 0i64;
        for level in &levels {
            let origin = level.world_x.unwrap_or(cursor);
            origins.push(origin as f32);
            cursor = origin + level.px_wid;
        }
        tracing::debug!(
            sub_levels = levels.len(),
            world_width = cursor,
            "level description resolved"
        );
        Ok(Self { levels, origins })
    }

    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let raw: RawLevelDescription = serde_json::from_str(json)?;
        Self::from_sub_levels(raw.levels)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let data = std::fs::read_to_string(path.as_ref())?;
        Self::from_json_str(&data)
    }

    pub fn sub_levels(&self) -> &[SubLevel] {
        &self.levels
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// World x of the left edge of sub-level `index`.
    pub fn origin_x(&self, index: usize) -> Option<f32> {
        self.origins.get(index).copied()
    }

    /// Sub-levels whose horizontal extent intersects `[start_x, end_x)`,
    /// in ascending document order, with their world x origin.
    pub fn overlapping(&self, start_x: f32, end_x: f32) -> impl Iterator<Item = (usize, f32, &SubLevel)> {
        self.levels
            .iter()
            .zip(self.origins.iter().copied())
            .enumerate()
            .filter(move |(_, (level, origin))| {
                let level_end = origin + level.px_wid as f32;
                *origin < end_x && level_end > start_x
            })
            .map(|(i, (level, origin))| (i, origin, level))
    }

    /// Rightmost world x covered by any sub-level.
    pub fn world_width(&self) -> f32 {
        self.levels
            .iter()
            .zip(&self.origins)
            .map(|(level, origin)| origin + level.px_wid as f32)
            .fold(0.0, f32::max)
    }

    /// Lowest world y covered by any sub-level.
    pub fn world_height(&self) -> f32 {
        self.levels
            .iter()
            .map(|level| (level.world_y + level.px_hei) as f32)
            .fold(0.0, f32::max)
    }

    /// World y span covered by all sub-levels, top to bottom. The top is
    /// negative when a sub-level sits above the world origin.
    pub fn vertical_extent(&self) -> Range<f32> {
        let top = self.levels.iter().map(|level| level.world_y).min().unwrap_or(0);
        let bottom = self
            .levels
            .iter()
            .map(|level| level.world_y + level.px_hei)
            .max()
            .unwrap_or(0);
        top as f32..bottom as f32
    }

    /// Tile size of the world grid: the first solid layer's cell size.
    pub fn grid_size(&self) -> u32 {
        self.levels
            .iter()
            .find_map(|level| level.solid_layer())
            .map(|layer| layer.grid_size)
            .filter(|size| *size > 0)
            .unwrap_or(DEFAULT_GRID_SIZE)
    }

    /// World position of the first `PlayerStart` entity. Earlier sub-levels win.
    pub fn player_start(&self) -> Option<Vec2> {
        self.levels
            .iter()
            .zip(&self.origins)
            .find_map(|(level, origin)| {
                let entity = level
                    .entity_layer()?
                    .entity_instances
                    .iter()
                    .find(|e| e.identifier == "PlayerStart")?;
                Some(Vec2::new(
                    origin + entity.px[0],
                    level.world_y as f32 + entity.px[1],
                ))
            })
    }
}

pub fn crate_info() -> &'static str {
    "sidescroll-level v0.1.0"
}
