//! Player movement and resource state machine.
//!
//! Driven by one [`PlayerMachine::tick`] per simulation step with the
//! current input snapshot and the body state reported by physics.
//!
//! # Invariants
//! - `0 <= stamina <= max_stamina` after every tick.
//! - Rolling and hovering are never active together.
//! - `Dying` is left only through `respawn`.

mod config;
mod machine;

pub use config::{DrainSchedule, DrainTier, PlayerConfig};
pub use machine::{
    BodyState, DamageOutcome, PlayerEvent, PlayerIntent, PlayerMachine, PlayerState,
};

pub fn crate_info() -> &'static str {
    "sidescroll-player v0.1.0"
}
