//! High score leaderboard
//!
//! Keeps the top ten finished workdays, best first.

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::sim::GameOutcome;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// A single high score entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighScoreEntry {
    /// Final score including bonuses
    pub score: u64,
    pub difficulty: Difficulty,
    pub outcome: GameOutcome,
    /// In-game minutes survived
    pub game_minutes: f64,
    /// Session time (ms) when recorded
    pub timestamp: f64,
}

/// Finished workdays ordered best first. Equal scores keep arrival order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct HighScores {
    pub entries: Vec<HighScoreEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self::default()
    }

    /// 1-based slot a score of `score` would take, or `None` when it would
    /// fall off the board. A zero score never ranks.
    pub fn rank_for(&self, score: u64) -> Option<usize> {
        let slot = self.entries.partition_point(|e| e.score >= score);
        (score > 0 && slot < MAX_HIGH_SCORES).then_some(slot + 1)
    }

    /// Place `entry` and drop whatever is pushed past the last slot
    pub fn insert(&mut self, entry: HighScoreEntry) -> Option<usize> {
        let rank = self.rank_for(entry.score)?;
        self.entries.insert(rank - 1, entry);
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }
}
