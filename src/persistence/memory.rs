//! In-memory store with a versioned JSON envelope

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::{Persistence, Statistics, StatisticsUpdate};
use crate::highscores::{HighScoreEntry, HighScores};
use crate::sim::AchievementId;

/// Bumped on any incompatible change to the saved layout
pub const SAVE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("malformed save data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported save version {found} (expected {expected})")]
    Version { found: u32, expected: u32 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveEnvelope {
    pub version: u32,
    pub high_scores: HighScores,
    pub achievements: BTreeSet<AchievementId>,
    pub statistics: Statistics,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemoryPersistence {
    high_scores: HighScores,
    achievements: BTreeSet<AchievementId>,
    statistics: Statistics,
}

impl MemoryPersistence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> Result<String, PersistenceError> {
        let envelope = SaveEnvelope {
            version: SAVE_VERSION,
            high_scores: self.high_scores.clone(),
            achievements: self.achievements.clone(),
            statistics: self.statistics.clone(),
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        let envelope: SaveEnvelope = serde_json::from_str(json)?;
        if envelope.version != SAVE_VERSION {
            return Err(PersistenceError::Version {
                found: envelope.version,
                expected: SAVE_VERSION,
            });
        }
        log::info!(
            "Loaded {} high scores, {} achievements",
            envelope.high_scores.entries.len(),
            envelope.achievements.len()
        );
        Ok(Self {
            high_scores: envelope.high_scores,
            achievements: envelope.achievements,
            statistics: envelope.statistics,
        })
    }
}

impl Persistence for MemoryPersistence {
    fn high_scores(&self) -> Vec<HighScoreEntry> {
        self.high_scores.entries.clone()
    }

    fn add_high_score(&mut self, entry: HighScoreEntry) -> Option<usize> {
        self.high_scores.insert(entry)
    }

    fn achievements(&self) -> Vec<AchievementId> {
        self.achievements.iter().copied().collect()
    }

    fn unlock_achievement(&mut self, id: AchievementId) -> bool {
        self.achievements.insert(id)
    }

    fn statistics(&self) -> Statistics {
        self.statistics.clone()
    }

    fn update_statistics(&mut self, update: StatisticsUpdate) {
        self.statistics.merge(&update);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Difficulty;
    use crate::sim::GameOutcome;

    #[test]
    fn json_envelope_restores_everything() {
        let mut store = MemoryPersistence::new();
        store.add_high_score(HighScoreEntry {
            score: 12_345,
            difficulty: Difficulty::Senior,
            outcome: GameOutcome::Victory,
            game_minutes: 600.0,
            timestamp: 1.0,
        });
        assert!(store.unlock_achievement(AchievementId::FirstVictory));
        assert!(!store.unlock_achievement(AchievementId::FirstVictory));
        store.update_statistics(StatisticsUpdate {
            games_played: 1,
            victories: 1,
            ..Default::default()
        });

        let json = store.to_json().unwrap();
        let restored = MemoryPersistence::from_json(&json).unwrap();
        assert_eq!(restored, store);
    }

    #[test]
    fn rejects_other_versions_and_garbage() {
        let json = r#"{"version":99,"high_scores":{"entries":[]},"achievements":[],
            "statistics":{"games_played":0,"victories":0,"total_drinks":0,
            "total_play_time":0.0,"best_score":0.0,"best_streak":0.0}}"#;
        assert!(matches!(
            MemoryPersistence::from_json(json),
            Err(PersistenceError::Version { found: 99, .. })
        ));
        assert!(matches!(
            MemoryPersistence::from_json("not json"),
            Err(PersistenceError::Json(_))
        ));
    }
}
