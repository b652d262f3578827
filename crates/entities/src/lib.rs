//! Entity lifecycle: factory registry, live instance records, gameplay groups.
//!
//! Records are keyed by [`StableKey`](sidescroll_common::StableKey) and indexed
//! by owning section.
//!
//! # Invariants
//! - At most one live record per stable key.
//! - Only the lifecycle manager destroys the instances it records.
//! - Gameplay code that destroys an instance must deregister it.

mod fields;
mod groups;
mod instance;
mod lifecycle;
mod registry;

pub use fields::EntityFields;
pub use groups::{EntityGroup, LifecycleConfig};
pub use instance::{BasicEntity, EntityInstance};
pub use lifecycle::{EntityLifecycleManager, EntityRecord};
pub use registry::{EntityFactory, FactoryRegistry, SpawnError};

pub fn crate_info() -> &'static str {
    "sidescroll-entities v0.1.0"
}
