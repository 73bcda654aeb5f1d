//! Error types for the simulation core
//!
//! Gameplay conditions (cooldowns, bans, wrong phase) are not errors here;
//! they surface as refusals next to the operation that produced them.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    #[error("unknown drink: {0}")]
    UnknownDrink(String),
    #[error("unknown event: {0}")]
    UnknownEvent(String),
    #[error("unknown power-up: {0}")]
    UnknownPowerUp(String),
    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}
