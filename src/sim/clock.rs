//! Pausable session clock
//!
//! The single time source for every subsystem. Only the game loop advances
//! it, and it refuses to move while paused, so cooldowns and event timers
//! freeze together with the rest of the simulation.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimClock {
    /// Session time in milliseconds
    now: f64,
    paused: bool,
}

impl SimClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current session time (ms)
    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Advance by `delta_ms`. Returns the new time. No-op while paused.
    pub fn advance(&mut self, delta_ms: f64) -> f64 {
        if !self.paused && delta_ms > 0.0 {
            self.now += delta_ms;
        }
        self.now
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }
}
