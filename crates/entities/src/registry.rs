use glam::Vec2;
use std::collections::HashMap;

use crate::fields::EntityFields;
use crate::instance::{BasicEntity, EntityInstance};

/// Errors a factory may report for a single entity.
#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("missing required field `{0}`")]
    MissingField(String),
    #[error("invalid field `{field}`: {reason}")]
    InvalidField { field: String, reason: String },
    #[error("backend refused spawn: {0}")]
    Backend(String),
}

/// Spawn function for one entity type. `C` is the embedding backend's context.
pub type EntityFactory<C> =
    Box<dyn Fn(&mut C, Vec2, &EntityFields) -> Result<Box<dyn EntityInstance>, SpawnError>>;

/// Maps entity type names to spawn functions.
pub struct FactoryRegistry<C> {
    factories: HashMap<String, EntityFactory<C>>,
}

impl<C> Default for FactoryRegistry<C> {
    fn default() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }
}

impl<C> FactoryRegistry<C> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory. A later registration for the same name replaces the earlier one.
    pub fn register<F>(&mut self, type_name: impl Into<String>, factory: F)
    where
        F: Fn(&mut C, Vec2, &EntityFields) -> Result<Box<dyn EntityInstance>, SpawnError> + 'static,
    {
        let type_name = type_name.into();
        if self.factories.insert(type_name.clone(), Box::new(factory)).is_some() {
            tracing::debug!(%type_name, "factory replaced");
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Registered type names, sorted.
    pub fn type_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Spawn an instance of `type_name` at `position`.
    ///
    /// Unregistered types yield a placeholder. A failing factory yields `None`
    /// for this entity only.
    pub fn create(
        &self,
        ctx: &mut C,
        type_name: &str,
        position: Vec2,
        fields: &EntityFields,
    ) -> Option<Box<dyn EntityInstance>> {
        let Some(factory) = self.factories.get(type_name) else {
            tracing::warn!(
                %type_name,
                x = position.x,
                y = position.y,
                "no factory registered, spawning placeholder"
            );
            return Some(Box::new(BasicEntity::placeholder(type_name, position)));
        };

        match factory(ctx, position, fields) {
            Ok(instance) => Some(instance),
            Err(err) => {
                tracing::warn!(%type_name, x = position.x, y = position.y, %err, "factory failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn basic(name: &'static str) -> impl Fn(&mut Vec<String>, Vec2, &EntityFields) -> Result<Box<dyn EntityInstance>, SpawnError> {
        move |log: &mut Vec<String>, pos: Vec2, fields: &EntityFields| {
            log.push(name.to_string());
            Ok::<_, SpawnError>(Box::new(BasicEntity::new(name, pos, fields.clone())) as Box<dyn EntityInstance>)
        }
    }

    #[test]
    fn create_uses_registered_factory() {
        let mut registry = FactoryRegistry::new();
        registry.register("Enemy", basic("Enemy"));
        let mut log = Vec::new();

        let instance = registry
            .create(&mut log, "Enemy", Vec2::new(5.0, 6.0), &EntityFields::default())
            .unwrap();
        assert_eq!(instance.type_name(), "Enemy");
        assert_eq!(instance.position(), Vec2::new(5.0, 6.0));
        assert!(!instance.is_placeholder());
        assert_eq!(log, vec!["Enemy"]);
    }

    #[test]
    fn unregistered_type_yields_placeholder() {
        let registry: FactoryRegistry<Vec<String>> = FactoryRegistry::new();
        let mut log = Vec::new();
        let instance = registry
            .create(&mut log, "GhostType", Vec2::new(10.0, 10.0), &EntityFields::default())
            .expect("placeholder instead of None");
        assert!(instance.is_placeholder());
        assert_eq!(instance.type_name(), "GhostType");
        assert_eq!(instance.position(), Vec2::new(10.0, 10.0));
        assert!(log.is_empty());
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = FactoryRegistry::new();
        registry.register("Thing", basic("first"));
        registry.register("Thing", basic("second"));
        assert_eq!(registry.len(), 1);

        let mut log = Vec::new();
        registry.create(&mut log, "Thing", Vec2::ZERO, &EntityFields::default());
        assert_eq!(log, vec!["second"]);
    }

    #[test]
    fn failing_factory_yields_none() {
        let mut registry: FactoryRegistry<Vec<String>> = FactoryRegistry::new();
        registry.register("Turret", |_: &mut Vec<String>, _: Vec2, _: &EntityFields| {
            Err(SpawnError::MissingField("direction".into()))
        });
        let mut log = Vec::new();
        assert!(
            registry
                .create(&mut log, "Turret", Vec2::ZERO, &EntityFields::default())
                .is_none()
        );
    }

    #[test]
    fn type_names_sorted() {
        let mut registry = FactoryRegistry::new();
        registry.register("Slime", basic("Slime"));
        registry.register("Drone", basic("Drone"));
        assert_eq!(registry.type_names(), vec!["Drone", "Slime"]);
        assert!(registry.contains("Drone"));
        assert!(!registry.contains("Bitcoin"));
    }
}
