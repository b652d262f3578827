//! Scene kernel: one `step` per tick drives streaming, the player machine,
//! pools and the event bus.
//!
//! # Invariants
//! - Per-tick order is fixed: clock, fall check, player, shots, streaming,
//!   pools, respawn, event forwarding.
//! - Nothing in `step` returns an error; failures degrade locally and are logged.
//! - Events are delivered synchronously in publish order.
//! - Game state changes only through `GameStore::dispatch`; each effective
//!   change is published as `GameEvent::StateChanged`.

pub mod bus;
pub mod config;
pub mod scene;
pub mod store;

pub use bus::{EventBus, GameEvent, Subscriber, SubscriptionId, Topic};
pub use config::{ConfigError, SceneConfig, WorldConfig};
pub use scene::{Scene, SceneSummary, StepReport};
pub use store::{GameAction, GameState, GameStatus, GameStore, HistoryEntry};

pub fn crate_info() -> &'static str {
    "sidescroll-kernel v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_info_names_kernel() {
        assert!(crate_info().starts_with("sidescroll-kernel"));
    }
}
