use serde::{Deserialize, Serialize};
use sidescroll_common::SimTime;
use std::time::Duration;

/// A logical input the player can drive. Device bindings map onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSignal {
    Up,
    Down,
    Left,
    Right,
    Jump,
    Roll,
    Shoot,
}

impl InputSignal {
    pub const ALL: [InputSignal; 7] = [
        InputSignal::Up,
        InputSignal::Down,
        InputSignal::Left,
        InputSignal::Right,
        InputSignal::Jump,
        InputSignal::Roll,
        InputSignal::Shoot,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct SignalState {
    down: bool,
    pressed_at: Option<SimTime>,
    just_pressed: bool,
    just_released: bool,
}

/// Per-frame snapshot of every input signal.
///
/// The driver calls [`InputState::begin_frame`] once per tick, then reports
/// the current level of each signal with [`InputState::set`].
#[derive(Debug, Clone, Default)]
pub struct InputState {
    signals: [SignalState; 7],
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear one-frame edges.
    pub fn begin_frame(&mut self) {
        for s in &mut self.signals {
            s.just_pressed = false;
            s.just_released = false;
        }
    }

    /// Report the level of `signal` at `now`. Edges are derived from the previous level.
    pub fn set(&mut self, signal: InputSignal, down: bool, now: SimTime) {
        let s = &mut self.signals[signal.index()];
        if down && !s.down {
            s.just_pressed = true;
            s.pressed_at = Some(now);
        } else if !down && s.down {
            s.just_released = true;
            s.pressed_at = None;
        }
        s.down = down;
    }

    pub fn press(&mut self, signal: InputSignal, now: SimTime) {
        self.set(signal, true, now);
    }

    pub fn release(&mut self, signal: InputSignal, now: SimTime) {
        self.set(signal, false, now);
    }

    pub fn is_held(&self, signal: InputSignal) -> bool {
        self.signals[signal.index()].down
    }

    pub fn just_pressed(&self, signal: InputSignal) -> bool {
        self.signals[signal.index()].just_pressed
    }

    pub fn just_released(&self, signal: InputSignal) -> bool {
        self.signals[signal.index()].just_released
    }

    /// How long `signal` has been held continuously, zero if released.
    pub fn held_for(&self, signal: InputSignal, now: SimTime) -> Duration {
        self.signals[signal.index()]
            .pressed_at
            .map(|at| now.since(at))
            .unwrap_or(Duration::ZERO)
    }
}
