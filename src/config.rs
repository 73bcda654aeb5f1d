//! Difficulty tables and game configuration
//!
//! The difficulty table is static data owned by the core. Everything a host
//! may change at runtime goes through [`ConfigPatch`], which is validated
//! before any field is written.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Bumped whenever a value in the difficulty table changes
pub const DIFFICULTY_TABLE_VERSION: u32 = 1;

/// Default number of simultaneously active power-ups
pub const DEFAULT_MAX_ACTIVE_POWER_UPS: usize = 3;

/// Difficulty levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum Difficulty {
    #[default]
    Intern,
    Junior,
    Senior,
    Founder,
}

impl Difficulty {
    pub const ALL: [Difficulty; 4] = [
        Difficulty::Intern,
        Difficulty::Junior,
        Difficulty::Senior,
        Difficulty::Founder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Intern => "intern",
            Difficulty::Junior => "junior",
            Difficulty::Senior => "senior",
            Difficulty::Founder => "founder",
        }
    }

    /// Workday length in in-game hours
    pub fn workday_length(&self) -> f64 {
        match self {
            Difficulty::Intern => 6.0,
            Difficulty::Junior => 8.0,
            Difficulty::Senior => 10.0,
            Difficulty::Founder => 12.0,
        }
    }

    /// Width of the optimal caffeine band
    pub fn optimal_zone_width(&self) -> f64 {
        match self {
            Difficulty::Intern => 40.0,
            Difficulty::Junior => 30.0,
            Difficulty::Senior => 24.0,
            Difficulty::Founder => 16.0,
        }
    }

    /// Caffeine lost per real second
    pub fn caffeine_depletion_rate(&self) -> f64 {
        match self {
            Difficulty::Intern => 0.3,
            Difficulty::Junior => 0.5,
            Difficulty::Senior => 0.7,
            Difficulty::Founder => 1.0,
        }
    }

    /// Applied to per-tick score and end-of-game bonuses
    pub fn score_multiplier(&self) -> f64 {
        match self {
            Difficulty::Intern => 1.0,
            Difficulty::Junior => 1.5,
            Difficulty::Senior => 2.0,
            Difficulty::Founder => 3.0,
        }
    }

    /// Event frequency factor (higher = events come sooner)
    pub fn event_frequency(&self) -> f64 {
        match self {
            Difficulty::Intern => 0.75,
            Difficulty::Junior => 1.0,
            Difficulty::Senior => 1.25,
            Difficulty::Founder => 1.5,
        }
    }

    /// In-game minutes per real second
    pub fn time_scale(&self) -> f64 {
        self.workday_length() * 60.0 * 1000.0 / crate::consts::WORKDAY_REAL_TIME
    }

    /// In-game minutes needed to clock out
    pub fn workday_minutes(&self) -> f64 {
        self.workday_length() * 60.0
    }
}

impl FromStr for Difficulty {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intern" => Ok(Difficulty::Intern),
            "junior" => Ok(Difficulty::Junior),
            "senior" => Ok(Difficulty::Senior),
            "founder" => Ok(Difficulty::Founder),
            _ => Err(CoreError::UnknownDifficulty(s.to_string())),
        }
    }
}

/// Optional gameplay systems
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureToggles {
    /// Random workplace events
    pub events: bool,
    /// Power-up activation
    pub power_ups: bool,
    /// Post-release crash tails on drinks
    pub crashes: bool,
    /// Achievement evaluation at game end
    pub achievements: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            events: true,
            power_ups: true,
            crashes: true,
            achievements: true,
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameConfig {
    pub difficulty: Difficulty,
    pub features: FeatureToggles,
    /// Concurrent power-up slots
    pub max_active_power_ups: usize,
    /// Scales every power-up cooldown
    pub cooldown_multiplier: f64,
    /// Seed for the event scheduler
    pub seed: u64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            features: FeatureToggles::default(),
            max_active_power_ups: DEFAULT_MAX_ACTIVE_POWER_UPS,
            cooldown_multiplier: 1.0,
            seed: 0xC0FFEE,
        }
    }
}

/// Partial config update. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConfigPatch {
    pub difficulty: Option<Difficulty>,
    pub events: Option<bool>,
    pub power_ups: Option<bool>,
    pub crashes: Option<bool>,
    pub achievements: Option<bool>,
    pub max_active_power_ups: Option<usize>,
    pub cooldown_multiplier: Option<f64>,
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Create a config for the given difficulty
    pub fn with_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            ..Self::default()
        }
    }

    /// Validate a patch without applying it
    pub fn validate(patch: &ConfigPatch) -> Result<(), CoreError> {
        if let Some(slots) = patch.max_active_power_ups {
            if slots == 0 {
                return Err(CoreError::InvalidConfig(
                    "max_active_power_ups must be at least 1".to_string(),
                ));
            }
        }
        if let Some(mult) = patch.cooldown_multiplier {
            if !mult.is_finite() || mult <= 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "cooldown_multiplier must be positive, got {mult}"
                )));
            }
        }
        Ok(())
    }

    /// Apply a patch. On error nothing is written.
    pub fn apply(&mut self, patch: &ConfigPatch) -> Result<(), CoreError> {
        Self::validate(patch)?;

        if let Some(difficulty) = patch.difficulty {
            self.difficulty = difficulty;
        }
        if let Some(events) = patch.events {
            self.features.events = events;
        }
        if let Some(power_ups) = patch.power_ups {
            self.features.power_ups = power_ups;
        }
        if let Some(crashes) = patch.crashes {
            self.features.crashes = crashes;
        }
        if let Some(achievements) = patch.achievements {
            self.features.achievements = achievements;
        }
        if let Some(slots) = patch.max_active_power_ups {
            self.max_active_power_ups = slots;
        }
        if let Some(mult) = patch.cooldown_multiplier {
            self.cooldown_multiplier = mult;
        }
        if let Some(seed) = patch.seed {
            self.seed = seed;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_from_str_is_case_insensitive() {
        assert_eq!("Founder".parse::<Difficulty>(), Ok(Difficulty::Founder));
        assert_eq!("junior".parse::<Difficulty>(), Ok(Difficulty::Junior));
        assert!(matches!(
            "ceo".parse::<Difficulty>(),
            Err(CoreError::UnknownDifficulty(_))
        ));
    }

    #[test]
    fn harder_levels_are_strictly_harder() {
        for pair in Difficulty::ALL.windows(2) {
            let (easy, hard) = (pair[0], pair[1]);
            assert!(hard.optimal_zone_width() < easy.optimal_zone_width());
            assert!(hard.caffeine_depletion_rate() > easy.caffeine_depletion_rate());
            assert!(hard.score_multiplier() > easy.score_multiplier());
            assert!(hard.event_frequency() > easy.event_frequency());
        }
    }

    #[test]
    fn time_scale_maps_real_workday_to_full_shift() {
        for d in Difficulty::ALL {
            let minutes = d.time_scale() * crate::consts::WORKDAY_REAL_TIME / 1000.0;
            assert!((minutes - d.workday_minutes()).abs() < 1e-9);
        }
    }

    #[test]
    fn invalid_patch_leaves_config_untouched() {
        let mut config = GameConfig::default();
        let before = config.clone();
        let patch = ConfigPatch {
            events: Some(false),
            cooldown_multiplier: Some(-1.0),
            ..Default::default()
        };
        assert!(matches!(
            config.apply(&patch),
            Err(CoreError::InvalidConfig(_))
        ));
        assert_eq!(config, before);

        let zero_slots = ConfigPatch {
            max_active_power_ups: Some(0),
            ..Default::default()
        };
        assert!(config.apply(&zero_slots).is_err());
        assert_eq!(config, before);
    }

    #[test]
    fn valid_patch_applies_only_given_fields() {
        let mut config = GameConfig::default();
        let patch = ConfigPatch {
            power_ups: Some(false),
            max_active_power_ups: Some(5),
            ..Default::default()
        };
        config.apply(&patch).unwrap();
        assert!(!config.features.power_ups);
        assert!(config.features.events);
        assert_eq!(config.max_active_power_ups, 5);
        assert_eq!(config.difficulty, Difficulty::Intern);
    }
}
