use glam::Vec2;
use sidescroll_common::{Facing, SectionIndex, StableKey};
use sidescroll_player::PlayerEvent;
use std::collections::BTreeMap;

use crate::store::GameAction;

/// Channel an event is delivered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    Stream,
    Player,
    Combat,
    Game,
}

/// Everything the scene announces.
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SectionLoaded { section: SectionIndex },
    SectionUnloaded { section: SectionIndex },
    EntityDespawned { key: StableKey },
    Player(PlayerEvent),
    BulletFired { origin: Vec2, facing: Facing },
    LevelReset,
    StateChanged { action: GameAction },
}

impl GameEvent {
    pub fn topic(&self) -> Topic {
        match self {
            GameEvent::SectionLoaded { .. }
            | GameEvent::SectionUnloaded { .. }
            | GameEvent::EntityDespawned { .. } => Topic::Stream,
            GameEvent::BulletFired { .. } => Topic::Combat,
            GameEvent::LevelReset | GameEvent::StateChanged { .. } => Topic::Game,
            GameEvent::Player(event) => match event {
                PlayerEvent::Shot { .. } => Topic::Combat,
                PlayerEvent::Died { .. } | PlayerEvent::GameOver | PlayerEvent::Respawned => {
                    Topic::Game
                }
                _ => Topic::Player,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Subscriber = Box<dyn FnMut(&GameEvent)>;

/// Instance-owned publish/subscribe channel.
///
/// Subscribers run synchronously in subscription order. Every published event
/// is also appended to a log that tooling drains.
#[derive(Default)]
pub struct EventBus {
    subscribers: BTreeMap<Topic, Vec<(SubscriptionId, Subscriber)>>,
    next_id: u64,
    log: Vec<GameEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, topic: Topic, subscriber: impl FnMut(&GameEvent) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers
            .entry(topic)
            .or_default()
            .push((id, Box::new(subscriber)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        for subs in self.subscribers.values_mut() {
            if let Some(pos) = subs.iter().position(|(sid, _)| *sid == id) {
                subs.remove(pos);
                return true;
            }
        }
        false
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.subscribers.get(&topic).map_or(0, Vec::len)
    }

    pub fn publish(&mut self, event: GameEvent) {
        if let Some(subs) = self.subscribers.get_mut(&event.topic()) {
            for (_, subscriber) in subs.iter_mut() {
                subscriber(&event);
            }
        }
        self.log.push(event);
    }

    /// Read-only access to the undrained log.
    pub fn events(&self) -> &[GameEvent] {
        &self.log
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.log)
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("topics", &self.subscribers.keys().collect::<Vec<_>>())
            .field("pending", &self.log.len())
            .finish()
    }
}
