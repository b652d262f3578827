use glam::Vec2;
use serde::{Deserialize, Serialize};
use sidescroll_common::SimTime;
use sidescroll_player::PlayerState;
use std::collections::VecDeque;

/// Overall flow of a play session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameStatus {
    #[default]
    Menu,
    Playing,
    Paused,
    GameOver,
}

/// Session-wide progress and the last known player readouts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    pub status: GameStatus,
    pub score: u64,
    pub lives: u32,
    pub level: u32,
    /// Respawn point reached most recently, if any.
    pub checkpoint: Option<Vec2>,
    pub health: u32,
    pub stamina: f32,
    pub bitcoins: u32,
    pub player_state: PlayerState,
}

impl GameState {
    pub fn new(lives: u32, health: u32, stamina: f32) -> Self {
        Self {
            status: GameStatus::Menu,
            score: 0,
            lives,
            level: 1,
            checkpoint: None,
            health,
            stamina,
            bitcoins: 0,
            player_state: PlayerState::Idle,
        }
    }

    /// The state after `action`. Pure; the store records the transition.
    pub fn reduce(&self, action: &GameAction) -> GameState {
        let mut next = self.clone();
        match *action {
            GameAction::SetScore(score) => next.score = score,
            GameAction::AddScore(points) => next.score = next.score.saturating_add(points),
            GameAction::SetLives(lives) => next.lives = lives,
            GameAction::SetHealth(health) => next.health = health,
            GameAction::SetStamina(stamina) => next.stamina = stamina,
            GameAction::SetBitcoins(bitcoins) => next.bitcoins = bitcoins,
            GameAction::CollectBitcoins(count) => next.bitcoins = next.bitcoins.saturating_add(count),
            GameAction::SetLevel(level) => next.level = level,
            GameAction::ReachCheckpoint(position) => next.checkpoint = Some(position),
            GameAction::ClearCheckpoint => next.checkpoint = None,
            GameAction::SetPlayerState(state) => next.player_state = state,
            GameAction::SetStatus(status) => next.status = status,
        }
        next
    }
}

/// A change request to the game state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameAction {
    SetScore(u64),
    AddScore(u64),
    SetLives(u32),
    SetHealth(u32),
    SetStamina(f32),
    SetBitcoins(u32),
    CollectBitcoins(u32),
    SetLevel(u32),
    ReachCheckpoint(Vec2),
    ClearCheckpoint,
    SetPlayerState(PlayerState),
    SetStatus(GameStatus),
}

/// One dispatched transition.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub action: GameAction,
    pub previous: GameState,
    pub at: SimTime,
}

/// Centralized game state with a bounded transition history.
///
/// All changes go through [`GameStore::dispatch`]. The scene publishes each
/// effective change on the event bus.
#[derive(Debug, Clone)]
pub struct GameStore {
    initial: GameState,
    state: GameState,
    history: VecDeque<HistoryEntry>,
    capacity: usize,
}

impl GameStore {
    pub fn new(initial: GameState, history_capacity: usize) -> Self {
        Self {
            state: initial.clone(),
            initial,
            history: VecDeque::with_capacity(history_capacity),
            capacity: history_capacity,
        }
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.history.iter()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    /// Apply `action`. Returns false, recording nothing, when the state is
    /// unchanged.
    pub fn dispatch(&mut self, action: GameAction, now: SimTime) -> bool {
        let next = self.state.reduce(&action);
        if next == self.state {
            return false;
        }
        if self.capacity > 0 {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(HistoryEntry {
                action,
                previous: std::mem::replace(&mut self.state, next),
                at: now,
            });
        } else {
            self.state = next;
        }
        tracing::trace!(?action, "game state changed");
        true
    }

    /// Back to the initial state. History is cleared.
    pub fn reset(&mut self) {
        self.state = self.initial.clone();
        self.history.clear();
    }
}
