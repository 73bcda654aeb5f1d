//! Game state and core simulation types
//!
//! `GameStateData` is the one aggregate the manager owns and mutates.
//! Everything outside the manager only ever sees a `GameSnapshot` copy.

use serde::{Deserialize, Serialize};

use super::drinks::DrinkEffect;
use super::events::{ActiveEvent, ScheduledEvent};
use super::notice::GameNotice;
use super::powerups::{ActivePowerUp, EffectModifiers};
use super::scoring::{GameOutcome, ScoreBreakdown};
use crate::config::{Difficulty, GameConfig};
use crate::consts::*;

/// Current phase of the session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GamePhase {
    Menu,
    Playing,
    Paused,
    GameOver,
    Victory,
}

impl GamePhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, GamePhase::GameOver | GamePhase::Victory)
    }
}

/// The player-facing numbers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStats {
    /// 0-100
    pub caffeine: f64,
    /// 0-100
    pub health: f64,
    pub score: f64,
    /// Seconds continuously in the zone, 0 outside it
    pub streak: f64,
    /// Longest streak this session (s)
    pub max_streak: f64,
    pub drinks_consumed: u32,
    /// Real seconds played
    pub time_elapsed: f64,
    pub is_in_optimal_zone: bool,
}

impl Default for GameStats {
    fn default() -> Self {
        Self {
            caffeine: STARTING_CAFFEINE,
            health: HEALTH_MAX,
            score: 0.0,
            streak: 0.0,
            max_streak: 0.0,
            drinks_consumed: 0,
            time_elapsed: 0.0,
            is_in_optimal_zone: OptimalZone::new(Difficulty::default(), 0.0)
                .contains(STARTING_CAFFEINE),
        }
    }
}

/// Clock bookkeeping. Session time is the caller's timestamp minus the
/// time spent paused.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClockState {
    /// Session ms of the first update
    pub start_time: Option<f64>,
    /// Session ms of the latest update
    pub last_update_time: Option<f64>,
    /// Caller timestamp of the latest update
    pub last_host_time: Option<f64>,
    /// Caller ms that fell inside pauses
    pub paused_ms: f64,
    /// Set by resume; the next update absorbs the pause gap
    pub resume_pending: bool,
    /// In-game minutes since clock-in
    pub game_time: f64,
    /// Real ms simulated this session
    pub real_time_elapsed: f64,
}

impl ClockState {
    /// Map a caller timestamp to session time, absorbing any pause gap
    pub fn session_time(&mut self, host_time: f64) -> f64 {
        if std::mem::take(&mut self.resume_pending) {
            if let Some(last) = self.last_host_time {
                self.paused_ms += (host_time - last).max(0.0);
            }
        }
        self.last_host_time = Some(host_time);
        host_time - self.paused_ms
    }
}

/// Symmetric caffeine band around the (possibly shifted) center
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalZone {
    pub low: f64,
    pub high: f64,
}

impl OptimalZone {
    pub fn new(difficulty: Difficulty, shift: f64) -> Self {
        let half = difficulty.optimal_zone_width() / 2.0;
        let center = OPTIMAL_ZONE_CENTER + shift;
        Self {
            low: center - half,
            high: center + half,
        }
    }

    pub fn contains(&self, caffeine: f64) -> bool {
        caffeine >= self.low && caffeine <= self.high
    }
}

/// Aggregate root of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameStateData {
    pub phase: GamePhase,
    pub stats: GameStats,
    pub config: GameConfig,
    pub clock: ClockState,
    /// Set once the session ends
    pub outcome: Option<GameOutcome>,
    pub final_score: Option<ScoreBreakdown>,
}

impl GameStateData {
    pub fn new(config: GameConfig) -> Self {
        let mut stats = GameStats::default();
        stats.is_in_optimal_zone = OptimalZone::new(config.difficulty, 0.0).contains(stats.caffeine);
        Self {
            phase: GamePhase::Menu,
            stats,
            config,
            clock: ClockState::default(),
            outcome: None,
            final_score: None,
        }
    }

    /// Fresh session state, keeping config
    pub fn reset(&mut self) {
        *self = Self::new(self.config.clone());
    }
}

/// Immutable copy handed to listeners
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub data: GameStateData,
    pub optimal_zone: OptimalZone,
    pub active_event: Option<ActiveEvent>,
    pub upcoming_event: Option<ScheduledEvent>,
    pub active_power_ups: Vec<ActivePowerUp>,
    pub power_up_effect: EffectModifiers,
    pub drink_effects: Vec<DrinkEffect>,
    /// Since the previous snapshot
    pub notices: Vec<GameNotice>,
}

impl GameSnapshot {
    pub fn phase(&self) -> GamePhase {
        self.data.phase
    }

    pub fn stats(&self) -> &GameStats {
        &self.data.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zone_is_symmetric_around_shifted_center() {
        let zone = OptimalZone::new(Difficulty::Junior, 0.0);
        assert_eq!((zone.low, zone.high), (35.0, 65.0));
        let shifted = OptimalZone::new(Difficulty::Junior, 10.0);
        assert_eq!((shifted.low, shifted.high), (45.0, 75.0));
        assert!(zone.contains(35.0) && zone.contains(65.0));
        assert!(!zone.contains(65.1));
    }

    #[test]
    fn new_state_starts_in_menu_at_full_health() {
        let data = GameStateData::new(GameConfig::with_difficulty(Difficulty::Founder));
        assert_eq!(data.phase, GamePhase::Menu);
        assert_eq!(data.stats.health, HEALTH_MAX);
        assert_eq!(data.stats.caffeine, STARTING_CAFFEINE);
        assert!(data.stats.is_in_optimal_zone);
        assert!(data.clock.start_time.is_none());
    }

    #[test]
    fn resume_gap_is_not_session_time() {
        let mut clock = ClockState::default();
        assert_eq!(clock.session_time(1_000.0), 1_000.0);
        assert_eq!(clock.session_time(2_000.0), 2_000.0);
        clock.resume_pending = true;
        assert_eq!(clock.session_time(62_000.0), 2_000.0);
        assert_eq!(clock.session_time(63_000.0), 3_000.0);
        assert_eq!(clock.paused_ms, 60_000.0);
    }

    #[test]
    fn reset_keeps_config() {
        let mut data = GameStateData::new(GameConfig::with_difficulty(Difficulty::Senior));
        data.stats.score = 123.0;
        data.phase = GamePhase::GameOver;
        data.reset();
        assert_eq!(data.stats.score, 0.0);
        assert_eq!(data.phase, GamePhase::Menu);
        assert_eq!(data.config.difficulty, Difficulty::Senior);
    }
}
