//! Simulation core
//!
//! All gameplay logic lives here:
//! - One pausable session clock feeds every subsystem
//! - The manager is the only writer of game state
//! - Subsystems publish modifiers and notices, never mutate stats
//! - No rendering, audio or storage dependencies

pub mod clock;
pub mod drinks;
pub mod events;
pub mod manager;
pub mod notice;
pub mod powerups;
pub mod scoring;
pub mod state;

pub use clock::SimClock;
pub use drinks::{
    Drink, DrinkEffect, DrinkEngine, DrinkKind, DrinkReceipt, DrinkRefusal, ReleaseProfile,
};
pub use events::{ActiveEvent, EventEffect, EventKind, EventNotice, EventScheduler, GameEvent};
pub use manager::{GameStateManager, ListenerId, StateListener};
pub use notice::GameNotice;
pub use powerups::{
    ActivationRefusal, ActivePowerUp, EffectModifiers, PowerUp, PowerUpEffect, PowerUpKind,
    PowerUpSystem,
};
pub use scoring::{
    AchievementId, GameOutcome, Rank, RankInfo, ScoreBreakdown, ScoringEngine, SessionSummary,
    format_score,
};
pub use state::{GamePhase, GameSnapshot, GameStateData, GameStats, OptimalZone};
