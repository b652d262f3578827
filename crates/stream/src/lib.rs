//! Streaming: section tile loading and the resident-set controller.
//!
//! # Invariants
//! - After every non-throttled update the resident set equals the buffer
//!   window around the player's clamped section.
//! - The player's own section is never unloaded.
//! - Unloading a section clears all of its columns on both tile layers.

mod controller;
mod tiles;

pub use controller::{StreamConfig, StreamController, StreamStats, StreamUpdate, UpdateHistory};
pub use tiles::{TileCell, TileLoader, TileMap, TileSurface};

pub fn crate_info() -> &'static str {
    "sidescroll-stream v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("stream"));
    }
}
