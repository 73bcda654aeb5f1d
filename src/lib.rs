//! Caffeine Rush - keep caffeine in the zone until the workday ends
//!
//! Core modules:
//! - `sim`: Simulation core (state machine, drinks, events, power-ups, scoring)
//! - `game_loop`: Fixed-timestep driver for the simulation
//! - `config`: Difficulty tables and validated game configuration
//! - `persistence`: High scores, achievements and lifetime statistics
//! - `highscores`: Top-10 leaderboard

pub mod config;
pub mod error;
pub mod game_loop;
pub mod highscores;
pub mod persistence;
pub mod sim;

pub use config::{ConfigPatch, Difficulty, FeatureToggles, GameConfig};
pub use error::CoreError;
pub use game_loop::{FrameStats, GameLoop, LoopConfig};
pub use highscores::HighScores;
pub use sim::{GamePhase, GameSnapshot, GameStateManager};

/// Game configuration constants
pub mod consts {
    /// Resource bounds
    pub const CAFFEINE_MIN: f64 = 0.0;
    pub const CAFFEINE_MAX: f64 = 100.0;
    pub const HEALTH_MIN: f64 = 0.0;
    pub const HEALTH_MAX: f64 = 100.0;

    /// Starting caffeine (dead center of the zone)
    pub const STARTING_CAFFEINE: f64 = 50.0;
    /// Center of the optimal zone before event shifts
    pub const OPTIMAL_ZONE_CENTER: f64 = 50.0;

    /// Health lost per real second outside the optimal zone
    pub const HEALTH_DEPLETION_RATE: f64 = 4.0;
    /// Caffeine within this distance of the max counts as an overdose
    pub const EXPLOSION_MARGIN: f64 = 10.0;

    /// Real milliseconds one full workday takes, whatever its length
    pub const WORKDAY_REAL_TIME: f64 = 300_000.0;

    /// Points per real second before multipliers
    pub const BASE_SCORE_RATE: f64 = 10.0;
    /// Score multiplier while inside the optimal zone
    pub const OPTIMAL_ZONE_SCORE_MULTIPLIER: f64 = 2.0;

    /// Instant drinks deliver their boost over this window (ms)
    pub const INSTANT_RELEASE_MS: f64 = 100.0;
    /// Crash window per severity point (ms)
    pub const CRASH_MS_PER_SEVERITY: f64 = 100.0;
    /// Caffeine lost at crash onset per severity point
    pub const CRASH_DEPTH_PER_SEVERITY: f64 = 2.0;

    /// Fixed simulation timestep (60 Hz, ms)
    pub const FIXED_TIME_STEP: f64 = 1000.0 / 60.0;
    /// Frame deltas above this are clamped (tab suspend, debugger)
    pub const MAX_DELTA_TIME: f64 = 250.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 16;
}

/// Clamp a resource value into `[min, max]`, mapping NaN to `min`.
#[inline]
pub fn clamp_resource(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        return min;
    }
    value.clamp(min, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_resource_handles_nan_and_bounds() {
        assert_eq!(clamp_resource(f64::NAN, 0.0, 100.0), 0.0);
        assert_eq!(clamp_resource(150.0, 0.0, 100.0), 100.0);
        assert_eq!(clamp_resource(-3.0, 0.0, 100.0), 0.0);
        assert_eq!(clamp_resource(42.5, 0.0, 100.0), 42.5);
    }
}
