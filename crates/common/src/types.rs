use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a live instance handed out by a factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub Uuid);

impl InstanceId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InstanceId {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic identity of a level entity, derived from its world position.
///
/// Two entity definitions that resolve to the same rounded position share a
/// key, so the same logical entity can never be live twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StableKey {
    pub x: i64,
    pub y: i64,
}

impl StableKey {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }

    pub fn from_position(pos: Vec2) -> Self {
        Self {
            x: pos.x.round() as i64,
            y: pos.y.round() as i64,
        }
    }
}

impl fmt::Display for StableKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Horizontal direction a character is looking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// -1.0 for left, 1.0 for right.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// The two independently addressable tile layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TileLayer {
    Ground,
    Platform,
}

impl TileLayer {
    pub const ALL: [TileLayer; 2] = [TileLayer::Ground, TileLayer::Platform];
}

/// A single decoded tile, addressed in world tile coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TilePlacement {
    pub tile_x: i32,
    pub tile_y: i32,
    pub tile_id: u32,
    pub layer: TileLayer,
    pub solid: bool,
}
