//! Shared types for the sidescroll core.
//!
//! # Invariants
//! - A section is identified only by its index; its world range is derived.
//! - Stable keys are a pure function of world position.

pub mod section;
pub mod time;
pub mod types;

pub use section::{SectionGrid, SectionIndex};
pub use time::SimTime;
pub use types::{Facing, InstanceId, StableKey, TileLayer, TilePlacement};

pub fn crate_info() -> &'static str {
    "sidescroll-common v0.1.0"
}
