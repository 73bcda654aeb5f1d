//! One-shot notifications delivered with the next snapshot
//!
//! Hosts use these for toasts, sounds and achievement popups.

use serde::{Deserialize, Serialize};

use super::drinks::DrinkKind;
use super::events::{EventKind, EventNotice};
use super::powerups::{PowerUpKind, PowerUpNotice};
use super::scoring::{AchievementId, GameOutcome};
use super::state::GamePhase;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameNotice {
    PhaseChanged { from: GamePhase, to: GamePhase },
    DrinkConsumed(DrinkKind),
    EventWarning { kind: EventKind, starts_at: f64 },
    EventStarted(EventKind),
    EventEnded(EventKind),
    PowerUpActivated(PowerUpKind),
    PowerUpExpired(PowerUpKind),
    PowerUpReady(PowerUpKind),
    EnteredZone,
    LeftZone,
    Milestone(u64),
    GameEnded(GameOutcome),
    NewHighScore { rank: usize },
    AchievementUnlocked(AchievementId),
}

impl From<EventNotice> for GameNotice {
    fn from(notice: EventNotice) -> Self {
        match notice {
            EventNotice::Warning { kind, starts_at } => GameNotice::EventWarning { kind, starts_at },
            EventNotice::Started(kind) => GameNotice::EventStarted(kind),
            EventNotice::Ended(kind) => GameNotice::EventEnded(kind),
        }
    }
}

impl From<PowerUpNotice> for GameNotice {
    fn from(notice: PowerUpNotice) -> Self {
        match notice {
            PowerUpNotice::Activated(kind) => GameNotice::PowerUpActivated(kind),
            PowerUpNotice::Expired(kind) => GameNotice::PowerUpExpired(kind),
            PowerUpNotice::Ready(kind) => GameNotice::PowerUpReady(kind),
        }
    }
}
