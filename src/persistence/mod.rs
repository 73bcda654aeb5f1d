//! Persistence collaborator
//!
//! The core only talks to storage at game-end boundaries, through the
//! [`Persistence`] trait. Hosts plug in their own backend (LocalStorage,
//! files); [`NullPersistence`] and [`MemoryPersistence`] ship with the crate.

mod memory;

pub use memory::{MemoryPersistence, PersistenceError, SAVE_VERSION, SaveEnvelope};

use serde::{Deserialize, Serialize};

use crate::highscores::HighScoreEntry;
use crate::sim::AchievementId;

/// Lifetime totals across sessions
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub games_played: u32,
    pub victories: u32,
    pub total_drinks: u64,
    /// Real seconds
    pub total_play_time: f64,
    pub best_score: f64,
    pub best_streak: f64,
}

/// Partial statistics update from one session
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatisticsUpdate {
    pub games_played: u32,
    pub victories: u32,
    pub drinks: u32,
    pub play_time: f64,
    pub score: Option<f64>,
    pub streak: Option<f64>,
}

impl Statistics {
    /// Counters add, bests keep the max
    pub fn merge(&mut self, update: &StatisticsUpdate) {
        self.games_played += update.games_played;
        self.victories += update.victories;
        self.total_drinks += u64::from(update.drinks);
        self.total_play_time += update.play_time.max(0.0);
        if let Some(score) = update.score {
            self.best_score = self.best_score.max(score);
        }
        if let Some(streak) = update.streak {
            self.best_streak = self.best_streak.max(streak);
        }
    }
}

pub trait Persistence {
    fn high_scores(&self) -> Vec<HighScoreEntry>;

    /// Returns the leaderboard rank if the entry made it
    fn add_high_score(&mut self, entry: HighScoreEntry) -> Option<usize>;

    fn achievements(&self) -> Vec<AchievementId>;

    /// Returns true only when newly unlocked
    fn unlock_achievement(&mut self, id: AchievementId) -> bool;

    fn statistics(&self) -> Statistics;

    fn update_statistics(&mut self, update: StatisticsUpdate);
}

/// Stores nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPersistence;

impl Persistence for NullPersistence {
    fn high_scores(&self) -> Vec<HighScoreEntry> {
        Vec::new()
    }

    fn add_high_score(&mut self, _entry: HighScoreEntry) -> Option<usize> {
        None
    }

    fn achievements(&self) -> Vec<AchievementId> {
        Vec::new()
    }

    fn unlock_achievement(&mut self, _id: AchievementId) -> bool {
        false
    }

    fn statistics(&self) -> Statistics {
        Statistics::default()
    }

    fn update_statistics(&mut self, _update: StatisticsUpdate) {}
}
