use glam::Vec2;
use sidescroll_common::InstanceId;
use std::fmt;

use crate::fields::EntityFields;

/// Capability surface the lifecycle manager needs from a live instance.
///
/// Engine backends wrap their scene objects behind this trait; tests use
/// headless stand-ins.
pub trait EntityInstance: fmt::Debug {
    fn id(&self) -> InstanceId;
    fn type_name(&self) -> &str;
    fn position(&self) -> Vec2;
    fn set_position(&mut self, position: Vec2);
    fn is_alive(&self) -> bool;
    fn destroy(&mut self);

    /// True for the marker spawned in place of an unregistered type.
    fn is_placeholder(&self) -> bool {
        false
    }
}

/// A behaviorless headless instance.
///
/// Serves as the unknown-type placeholder and as a simple instance for
/// factories that only need a positioned body.
#[derive(Debug, Clone)]
pub struct BasicEntity {
    id: InstanceId,
    type_name: String,
    position: Vec2,
    alive: bool,
    placeholder: bool,
    /// Whether the backend should give this instance a physics body.
    pub has_body: bool,
    pub fields: EntityFields,
}

impl BasicEntity {
    pub fn new(type_name: impl Into<String>, position: Vec2, fields: EntityFields) -> Self {
        Self {
            id: InstanceId::new(),
            type_name: type_name.into(),
            position,
            alive: true,
            placeholder: false,
            has_body: true,
            fields,
        }
    }

    /// Visible marker with a body but no behavior.
    pub fn placeholder(type_name: impl Into<String>, position: Vec2) -> Self {
        Self {
            placeholder: true,
            ..Self::new(type_name, position, EntityFields::default())
        }
    }
}

impl EntityInstance for BasicEntity {
    fn id(&self) -> InstanceId {
        self.id
    }

    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    fn is_alive(&self) -> bool {
        self.alive
    }

    fn destroy(&mut self) {
        self.alive = false;
    }

    fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}
