//! Scoring, milestones, ranks and achievements

use serde::{Deserialize, Serialize};

use crate::config::Difficulty;
use crate::consts::{BASE_SCORE_RATE, HEALTH_MAX, OPTIMAL_ZONE_SCORE_MULTIPLIER};

/// Score thresholds announced once per session
pub const MILESTONES: [u64; 6] = [1_000, 5_000, 10_000, 25_000, 50_000, 100_000];

pub const VICTORY_BONUS: f64 = 5_000.0;
/// Per second of the longest streak
pub const STREAK_BONUS_PER_SECOND: f64 = 10.0;
/// Per point of health left at the end
pub const HEALTH_BONUS_PER_POINT: f64 = 50.0;

/// How a session ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameOutcome {
    Victory,
    /// Health ran out with caffeine near the max
    Explosion,
    /// Health ran out any other way
    PassOut,
    /// Ended early by the player
    Quit,
}

impl GameOutcome {
    pub fn is_victory(self) -> bool {
        self == GameOutcome::Victory
    }
}

/// End-of-game score components
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub base: f64,
    pub victory_bonus: f64,
    pub streak_bonus: f64,
    pub health_bonus: f64,
    pub difficulty_multiplier: f64,
    pub total: f64,
    pub rank: Rank,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rank {
    F,
    D,
    C,
    B,
    A,
    S,
    SPlus,
}

/// Display metadata for a rank
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankInfo {
    pub rank: Rank,
    pub label: &'static str,
    pub title: &'static str,
    /// Hex color
    pub color: &'static str,
    pub min_score: u64,
}

const RANKS: [RankInfo; 7] = [
    RankInfo { rank: Rank::SPlus, label: "S+", title: "Caffeine Deity", color: "#ffd700", min_score: 100_000 },
    RankInfo { rank: Rank::S, label: "S", title: "Espresso Virtuoso", color: "#ff8c00", min_score: 50_000 },
    RankInfo { rank: Rank::A, label: "A", title: "Senior Sipper", color: "#9b59b6", min_score: 25_000 },
    RankInfo { rank: Rank::B, label: "B", title: "Reliable Brewer", color: "#3498db", min_score: 10_000 },
    RankInfo { rank: Rank::C, label: "C", title: "Decaf Dabbler", color: "#2ecc71", min_score: 5_000 },
    RankInfo { rank: Rank::D, label: "D", title: "Sleepy Intern", color: "#95a5a6", min_score: 1_000 },
    RankInfo { rank: Rank::F, label: "F", title: "Fired", color: "#e74c3c", min_score: 0 },
];

impl Rank {
    pub fn for_score(score: f64) -> Rank {
        rank_info(score).rank
    }

    pub fn info(self) -> RankInfo {
        RANKS
            .iter()
            .copied()
            .find(|r| r.rank == self)
            .unwrap_or(RANKS[RANKS.len() - 1])
    }
}

/// Highest tier whose threshold `score` reaches
pub fn rank_info(score: f64) -> RankInfo {
    let score = score.max(0.0);
    RANKS
        .iter()
        .copied()
        .find(|r| score >= r.min_score as f64)
        .unwrap_or(RANKS[RANKS.len() - 1])
}

/// `999`, `1K`, `1.5K`, `2.3M`
pub fn format_score(score: f64) -> String {
    let score = score.max(0.0).floor();
    let (value, suffix) = if score >= 1_000_000.0 {
        (score / 1_000_000.0, "M")
    } else if score >= 1_000.0 {
        (score / 1_000.0, "K")
    } else {
        return format!("{}", score as u64);
    };
    let tenths = (value * 10.0).floor() / 10.0;
    let text = format!("{tenths:.1}");
    let text = text.strip_suffix(".0").unwrap_or(&text);
    format!("{text}{suffix}")
}

/// Per-session score accrual and milestone tracking
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoringEngine {
    difficulty: Difficulty,
    /// Indexed like `MILESTONES`
    reached: [bool; MILESTONES.len()],
}

impl ScoringEngine {
    pub fn new(difficulty: Difficulty) -> Self {
        Self {
            difficulty,
            reached: [false; MILESTONES.len()],
        }
    }

    pub fn set_difficulty(&mut self, difficulty: Difficulty) {
        self.difficulty = difficulty;
    }

    /// Points earned over `dt_secs`. `external` is the power-up multiplier.
    pub fn tick_score(&self, dt_secs: f64, in_zone: bool, streak_secs: f64, external: f64) -> f64 {
        if dt_secs <= 0.0 {
            return 0.0;
        }
        let zone = if in_zone { OPTIMAL_ZONE_SCORE_MULTIPLIER } else { 1.0 };
        let streak_minutes = streak_secs.max(0.0) / 60.0;
        BASE_SCORE_RATE
            * dt_secs
            * zone
            * self.difficulty.score_multiplier()
            * (1.0 + streak_minutes)
            * external.max(0.0)
    }

    /// Milestones crossed going from `before` to `after`, each at most once
    pub fn check_milestones(&mut self, before: f64, after: f64) -> Vec<u64> {
        let mut crossed = Vec::new();
        for (i, &threshold) in MILESTONES.iter().enumerate() {
            let t = threshold as f64;
            if !self.reached[i] && before < t && after >= t {
                self.reached[i] = true;
                crossed.push(threshold);
            }
        }
        crossed
    }

    pub fn milestones_reached(&self) -> impl Iterator<Item = u64> + '_ {
        MILESTONES
            .iter()
            .zip(self.reached.iter())
            .filter(|(_, reached)| **reached)
            .map(|(m, _)| *m)
    }

    pub fn reset(&mut self) {
        self.reached = [false; MILESTONES.len()];
    }

    /// Final score from end-of-game stats
    pub fn calculate_final_score(
        &self,
        base: f64,
        max_streak_secs: f64,
        health: f64,
        outcome: GameOutcome,
    ) -> ScoreBreakdown {
        let mult = self.difficulty.score_multiplier();
        let victory_bonus = if outcome.is_victory() { VICTORY_BONUS * mult } else { 0.0 };
        let streak_bonus = max_streak_secs.max(0.0) * STREAK_BONUS_PER_SECOND * mult;
        let health_bonus = health.clamp(0.0, HEALTH_MAX) * HEALTH_BONUS_PER_POINT * mult;
        let total = base + victory_bonus + streak_bonus + health_bonus;
        ScoreBreakdown {
            base,
            victory_bonus,
            streak_bonus,
            health_bonus,
            difficulty_multiplier: mult,
            total,
            rank: Rank::for_score(total),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AchievementId {
    FirstVictory,
    PerfectHealth,
    ZenMaster,
    CaffeineConnoisseur,
    Minimalist,
    FounderMode,
    HighRoller,
    Kaboom,
    Veteran,
}

impl AchievementId {
    pub const ALL: [AchievementId; 9] = [
        AchievementId::FirstVictory,
        AchievementId::PerfectHealth,
        AchievementId::ZenMaster,
        AchievementId::CaffeineConnoisseur,
        AchievementId::Minimalist,
        AchievementId::FounderMode,
        AchievementId::HighRoller,
        AchievementId::Kaboom,
        AchievementId::Veteran,
    ];

    pub fn title(self) -> &'static str {
        match self {
            AchievementId::FirstVictory => "Clocked Out",
            AchievementId::PerfectHealth => "Fresh as a Daisy",
            AchievementId::ZenMaster => "Zen Master",
            AchievementId::CaffeineConnoisseur => "Caffeine Connoisseur",
            AchievementId::Minimalist => "Minimalist",
            AchievementId::FounderMode => "Founder Mode",
            AchievementId::HighRoller => "High Roller",
            AchievementId::Kaboom => "Kaboom",
            AchievementId::Veteran => "Veteran",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AchievementId::FirstVictory => "Survive a full workday",
            AchievementId::PerfectHealth => "Win with full health",
            AchievementId::ZenMaster => "Stay in the zone for two straight minutes",
            AchievementId::CaffeineConnoisseur => "Drink 20 times in one day",
            AchievementId::Minimalist => "Win with three drinks or fewer",
            AchievementId::FounderMode => "Win on founder difficulty",
            AchievementId::HighRoller => "Finish with 50K points",
            AchievementId::Kaboom => "Overdose on caffeine",
            AchievementId::Veteran => "Play ten workdays",
        }
    }
}

/// Inputs for achievement evaluation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSummary {
    pub outcome: GameOutcome,
    pub difficulty: Difficulty,
    pub final_score: f64,
    pub health: f64,
    pub max_streak_secs: f64,
    pub drinks_consumed: u32,
    /// Lifetime count including this session
    pub games_played: u32,
}

/// Achievements earned by a finished session
pub fn evaluate_achievements(summary: &SessionSummary) -> Vec<AchievementId> {
    let won = summary.outcome.is_victory();
    AchievementId::ALL
        .into_iter()
        .filter(|id| match id {
            AchievementId::FirstVictory => won,
            AchievementId::PerfectHealth => won && summary.health >= HEALTH_MAX,
            AchievementId::ZenMaster => summary.max_streak_secs >= 120.0,
            AchievementId::CaffeineConnoisseur => summary.drinks_consumed >= 20,
            AchievementId::Minimalist => won && summary.drinks_consumed <= 3,
            AchievementId::FounderMode => won && summary.difficulty == Difficulty::Founder,
            AchievementId::HighRoller => summary.final_score >= 50_000.0,
            AchievementId::Kaboom => summary.outcome == GameOutcome::Explosion,
            AchievementId::Veteran => summary.games_played >= 10,
        })
        .collect()
}
