use glam::Vec2;
use sidescroll_common::{SectionIndex, StableKey};
use sidescroll_level::LevelDescription;
use std::collections::{BTreeMap, BTreeSet};
use std::ops::Range;
use std::sync::Arc;

use crate::fields::EntityFields;
use crate::groups::{EntityGroup, LifecycleConfig};
use crate::instance::EntityInstance;
use crate::registry::FactoryRegistry;

/// A live entity spawned from level data.
#[derive(Debug)]
pub struct EntityRecord {
    pub key: StableKey,
    pub section: SectionIndex,
    pub type_name: String,
    pub group: Option<EntityGroup>,
    instance: Box<dyn EntityInstance>,
}

impl EntityRecord {
    pub fn instance(&self) -> &dyn EntityInstance {
        self.instance.as_ref()
    }

    pub fn instance_mut(&mut self) -> &mut dyn EntityInstance {
        self.instance.as_mut()
    }
}

/// Owns every instance spawned from level data, indexed by stable key and section.
///
/// Iteration is in key order ([`BTreeMap`]) so spawn and teardown are
/// deterministic for a given level.
pub struct EntityLifecycleManager<C> {
    level: Arc<LevelDescription>,
    registry: FactoryRegistry<C>,
    config: LifecycleConfig,
    records: BTreeMap<StableKey, EntityRecord>,
    by_section: BTreeMap<SectionIndex, BTreeSet<StableKey>>,
    groups: BTreeMap<EntityGroup, BTreeSet<StableKey>>,
}

impl<C> EntityLifecycleManager<C> {
    pub fn new(level: Arc<LevelDescription>, registry: FactoryRegistry<C>, config: LifecycleConfig) -> Self {
        Self {
            level,
            registry,
            config,
            records: BTreeMap::new(),
            by_section: BTreeMap::new(),
            groups: BTreeMap::new(),
        }
    }

    pub fn registry(&self) -> &FactoryRegistry<C> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut FactoryRegistry<C> {
        &mut self.registry
    }

    pub fn config(&self) -> &LifecycleConfig {
        &self.config
    }

    /// Spawn every entity of `section` whose world x lies in `range`.
    ///
    /// Keys already live anywhere are skipped, so calling this twice without
    /// an unload spawns nothing the second time. Returns the number spawned.
    pub fn load_section_entities(&mut self, section: SectionIndex, range: Range<f32>, ctx: &mut C) -> usize {
        let level = Arc::clone(&self.level);
        let mut spawned = 0;

        for (index, origin_x, sub_level) in level.overlapping(range.start, range.end) {
            let Some(layer) = sub_level.entity_layer() else {
                tracing::debug!(section, sub_level = index, "sub-level has no entity layer");
                continue;
            };

            for def in &layer.entity_instances {
                let position = Vec2::new(origin_x + def.px[0], sub_level.world_y as f32 + def.px[1]);
                if !range.contains(&position.x) || self.config.is_marker(&def.identifier) {
                    continue;
                }

                let key = StableKey::from_position(position);
                if self.records.contains_key(&key) {
                    tracing::trace!(section, %key, "entity already live, skipping");
                    continue;
                }

                let fields = EntityFields::from_instances(&def.field_instances);
                let Some(instance) = self.registry.create(ctx, &def.identifier, position, &fields) else {
                    continue;
                };
                self.insert(key, section, def.identifier.clone(), instance);
                spawned += 1;
            }
        }

        tracing::debug!(section, spawned, live = self.records.len(), "section entities loaded");
        spawned
    }

    /// Destroy and forget every record owned by `section`. Returns the number removed.
    pub fn unload_section_entities(&mut self, section: SectionIndex) -> usize {
        let Some(keys) = self.by_section.remove(&section) else {
            return 0;
        };

        let mut removed = 0;
        for key in keys {
            if let Some(mut record) = self.records.remove(&key) {
                self.leave_group(&record);
                if record.instance.is_alive() {
                    record.instance.destroy();
                }
                removed += 1;
            }
        }

        tracing::debug!(section, removed, live = self.records.len(), "section entities unloaded");
        removed
    }

    /// Destroy a single record on behalf of gameplay code (kill, pickup).
    pub fn despawn(&mut self, key: StableKey) -> bool {
        match self.forget(key) {
            Some(mut record) => {
                if record.instance.is_alive() {
                    record.instance.destroy();
                }
                true
            }
            None => false,
        }
    }

    /// Forget a record whose instance gameplay code already destroyed or took over.
    pub fn deregister(&mut self, key: StableKey) -> Option<Box<dyn EntityInstance>> {
        self.forget(key).map(|record| record.instance)
    }

    /// Destroy every record.
    pub fn clear(&mut self) -> usize {
        let count = self.records.len();
        for record in self.records.values_mut() {
            if record.instance.is_alive() {
                record.instance.destroy();
            }
        }
        self.records.clear();
        self.by_section.clear();
        self.groups.clear();
        count
    }

    /// Keys whose instance reports dead. Always empty unless gameplay code
    /// destroyed an instance without deregistering it.
    pub fn stale_keys(&self) -> Vec<StableKey> {
        self.records
            .values()
            .filter(|r| !r.instance.is_alive())
            .map(|r| r.key)
            .collect()
    }

    pub fn get(&self, key: StableKey) -> Option<&EntityRecord> {
        self.records.get(&key)
    }

    pub fn get_mut(&mut self, key: StableKey) -> Option<&mut EntityRecord> {
        self.records.get_mut(&key)
    }

    pub fn contains(&self, key: StableKey) -> bool {
        self.records.contains_key(&key)
    }

    pub fn live_count(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> impl Iterator<Item = &EntityRecord> {
        self.records.values()
    }

    pub fn section_keys(&self, section: SectionIndex) -> impl Iterator<Item = StableKey> + '_ {
        self.by_section.get(&section).into_iter().flatten().copied()
    }

    pub fn section_count(&self, section: SectionIndex) -> usize {
        self.by_section.get(&section).map_or(0, BTreeSet::len)
    }

    pub fn group_members(&self, group: EntityGroup) -> impl Iterator<Item = StableKey> + '_ {
        self.groups.get(&group).into_iter().flatten().copied()
    }

    fn insert(&mut self, key: StableKey, section: SectionIndex, type_name: String, instance: Box<dyn EntityInstance>) {
        let group = self.config.group_for(&type_name);
        if let Some(group) = group {
            self.groups.entry(group).or_default().insert(key);
        }
        self.by_section.entry(section).or_default().insert(key);
        tracing::trace!(section, %key, %type_name, ?group, "entity spawned");
        self.records.insert(
            key,
            EntityRecord {
                key,
                section,
                type_name,
                group,
                instance,
            },
        );
    }

    fn forget(&mut self, key: StableKey) -> Option<EntityRecord> {
        let record = self.records.remove(&key)?;
        if let Some(keys) = self.by_section.get_mut(&record.section) {
            keys.remove(&key);
            if keys.is_empty() {
                self.by_section.remove(&record.section);
            }
        }
        self.leave_group(&record);
        Some(record)
    }

    fn leave_group(&mut self, record: &EntityRecord) {
        if let Some(group) = record.group {
            if let Some(members) = self.groups.get_mut(&group) {
                members.remove(&record.key);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::BasicEntity;
    use crate::registry::SpawnError;
    use sidescroll_common::InstanceId;
    use sidescroll_level::{EntityDef, LayerInstance, SubLevel};
    use std::cell::Cell;
    use std::rc::Rc;

    /// Instance that counts how many times it was destroyed.
    #[derive(Debug)]
    struct Tracked {
        inner: BasicEntity,
        destroyed: Rc<Cell<u32>>,
    }

    impl EntityInstance for Tracked {
        fn id(&self) -> InstanceId {
            self.inner.id()
        }
        fn type_name(&self) -> &str {
            self.inner.type_name()
        }
        fn position(&self) -> Vec2 {
            self.inner.position()
        }
        fn set_position(&mut self, position: Vec2) {
            self.inner.set_position(position);
        }
        fn is_alive(&self) -> bool {
            self.inner.is_alive()
        }
        fn destroy(&mut self) {
            self.destroyed.set(self.destroyed.get() + 1);
            self.inner.destroy();
        }
    }

    fn level() -> Arc<LevelDescription> {
        let first = SubLevel::new("L0", 2048, 512).with_layer(LayerInstance::entities(
            "Entities",
            vec![
                EntityDef::new("PlayerStart", 100.0, 400.0),
                EntityDef::new("Enemy", 200.0, 400.0),
                EntityDef::new("Bitcoin", 700.0, 300.0),
                EntityDef::new("Zapper", 2000.0, 400.0),
            ],
        ));
        let second = SubLevel::new("L1", 2048, 512).with_layer(LayerInstance::entities(
            "Entities",
            vec![
                EntityDef::new("NeutralObject", 100.0, 400.0),
                EntityDef::new("GhostType", 1000.0, 400.0),
            ],
        ));
        Arc::new(LevelDescription::from_sub_levels(vec![first, second]).unwrap())
    }

    fn manager(destroyed: Rc<Cell<u32>>) -> EntityLifecycleManager<Vec<String>> {
        let mut registry = FactoryRegistry::new();
        for name in ["Enemy", "Bitcoin", "Zapper", "NeutralObject"] {
            let destroyed = Rc::clone(&destroyed);
            registry.register(name, move |log: &mut Vec<String>, pos: Vec2, fields: &EntityFields| {
                log.push(name.to_string());
                Ok::<_, SpawnError>(Box::new(Tracked {
                    inner: BasicEntity::new(name, pos, fields.clone()),
                    destroyed: Rc::clone(&destroyed),
                }) as Box<dyn EntityInstance>)
            });
        }
        EntityLifecycleManager::new(level(), registry, LifecycleConfig::default())
    }

    #[test]
    fn loads_entities_in_range_and_skips_markers() {
        let mut m = manager(Rc::default());
        let mut log = Vec::new();
        let spawned = m.load_section_entities(0, 0.0..640.0, &mut log);
        assert_eq!(spawned, 1);
        assert_eq!(log, vec!["Enemy"]);
        assert!(m.contains(StableKey::new(200, 400)));
        assert!(!m.contains(StableKey::new(100, 400)));
    }

    #[test]
    fn reload_without_unload_is_idempotent() {
        let mut m = manager(Rc::default());
        let mut log = Vec::new();
        m.load_section_entities(1, 640.0..1280.0, &mut log);
        let first: Vec<StableKey> = m.records().map(|r| r.key).collect();

        let again = m.load_section_entities(1, 640.0..1280.0, &mut log);
        let second: Vec<StableKey> = m.records().map(|r| r.key).collect();
        assert_eq!(again, 0);
        assert_eq!(first, second);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn straddling_section_pulls_from_both_sub_levels() {
        let mut m = manager(Rc::default());
        let mut log = Vec::new();
        // Section 3 at width 640 covers [1920, 2560).
        let spawned = m.load_section_entities(3, 1920.0..2560.0, &mut log);
        assert_eq!(spawned, 2);
        assert!(m.contains(StableKey::new(2000, 400)));
        assert!(m.contains(StableKey::new(2148, 400)));
        assert_eq!(m.section_count(3), 2);
    }

    #[test]
    fn unload_destroys_and_allows_respawn() {
        let destroyed = Rc::new(Cell::new(0));
        let mut m = manager(Rc::clone(&destroyed));
        let mut log = Vec::new();
        m.load_section_entities(3, 1920.0..2560.0, &mut log);

        assert_eq!(m.unload_section_entities(3), 2);
        assert_eq!(destroyed.get(), 2);
        assert_eq!(m.live_count(), 0);
        assert_eq!(m.group_members(EntityGroup::Enemies).count(), 0);

        assert_eq!(m.load_section_entities(3, 1920.0..2560.0, &mut log), 2);
    }

    #[test]
    fn unknown_type_spawns_placeholder() {
        let mut m = manager(Rc::default());
        let mut log = Vec::new();
        // GhostType sits at world x 2048 + 1000.
        m.load_section_entities(4, 2560.0..3200.0, &mut log);
        let record = m.get(StableKey::new(3048, 400)).unwrap();
        assert!(record.instance().is_placeholder());
        assert_eq!(record.group, None);
    }

    #[test]
    fn spawned_entities_join_groups() {
        let mut m = manager(Rc::default());
        let mut log = Vec::new();
        m.load_section_entities(0, 0.0..640.0, &mut log);
        m.load_section_entities(3, 1920.0..2560.0, &mut log);

        let enemies: Vec<StableKey> = m.group_members(EntityGroup::Enemies).collect();
        assert_eq!(enemies, vec![StableKey::new(200, 400), StableKey::new(2000, 400)]);
        let neutral: Vec<StableKey> = m.group_members(EntityGroup::Neutral).collect();
        assert_eq!(neutral, vec![StableKey::new(2148, 400)]);
    }

    #[test]
    fn despawn_removes_record_and_group() {
        let destroyed = Rc::new(Cell::new(0));
        let mut m = manager(Rc::clone(&destroyed));
        let mut log = Vec::new();
        m.load_section_entities(0, 0.0..640.0, &mut log);

        assert!(m.despawn(StableKey::new(200, 400)));
        assert!(!m.despawn(StableKey::new(200, 400)));
        assert_eq!(destroyed.get(), 1);
        assert_eq!(m.section_count(0), 0);
        assert_eq!(m.group_members(EntityGroup::Enemies).count(), 0);
        assert_eq!(m.unload_section_entities(0), 0);
    }

    #[test]
    fn gameplay_destroy_without_deregister_is_detected() {
        let mut m = manager(Rc::default());
        let mut log = Vec::new();
        m.load_section_entities(0, 0.0..640.0, &mut log);
        let key = StableKey::new(200, 400);

        m.get_mut(key).unwrap().instance_mut().destroy();
        assert_eq!(m.stale_keys(), vec![key]);

        let instance = m.deregister(key).unwrap();
        assert!(!instance.is_alive());
        assert!(m.stale_keys().is_empty());
    }

    #[test]
    fn clear_destroys_everything() {
        let destroyed = Rc::new(Cell::new(0));
        let mut m = manager(Rc::clone(&destroyed));
        let mut log = Vec::new();
        m.load_section_entities(0, 0.0..640.0, &mut log);
        m.load_section_entities(3, 1920.0..2560.0, &mut log);

        assert_eq!(m.clear(), 3);
        assert_eq!(destroyed.get(), 3);
        assert_eq!(m.live_count(), 0);
    }
}
