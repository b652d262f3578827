use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Coarse gameplay category used by collision wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EntityGroup {
    Enemies,
    Neutral,
    Interactive,
}

/// Rules applied when an entity is spawned from level data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Types that mark positions in level data and are never spawned.
    pub marker_types: BTreeSet<String>,
    /// Type name to gameplay group. Unlisted types join no group.
    pub groups: BTreeMap<String, EntityGroup>,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            marker_types: BTreeSet::from(["PlayerStart".to_string()]),
            groups: BTreeMap::from([
                ("Enemy".to_string(), EntityGroup::Enemies),
                ("Zapper".to_string(), EntityGroup::Enemies),
                ("NeutralObject".to_string(), EntityGroup::Neutral),
                ("InteractiveObject".to_string(), EntityGroup::Interactive),
            ]),
        }
    }
}

impl LifecycleConfig {
    pub fn group_for(&self, type_name: &str) -> Option<EntityGroup> {
        self.groups.get(type_name).copied()
    }

    pub fn is_marker(&self, type_name: &str) -> bool {
        self.marker_types.contains(type_name)
    }
}
