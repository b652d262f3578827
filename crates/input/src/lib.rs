//! Input signals consumed by gameplay state machines.
//!
//! # Invariants
//! - Gameplay reads signals, never raw device events.
//! - Edges (`just_pressed`, `just_released`) are valid for exactly one frame.

pub mod signal;

pub use signal::{InputSignal, InputState};

pub fn crate_info() -> &'static str {
    "sidescroll-input v0.1.0"
}
