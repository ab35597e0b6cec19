//! Error taxonomy for player-facing operations.
//!
//! Every variant is request-scoped and recoverable at the boundary; the
//! transport maps them to a status code and message. No engine error crashes
//! the process.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Clone, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum GameError {
    #[error("game already started")]
    AlreadyStarted,
    #[error("game not started")]
    NotStarted,
    #[error("need at least {minimum} players to start")]
    NotEnoughPlayers { minimum: usize },
    #[error("game is full")]
    CapacityReached,
    #[error("game already started, {name} cannot join")]
    JoinAfterStart { name: String },
    #[error("player {name} not found")]
    PlayerNotFound { name: String },
    #[error("invalid player name: {name:?}")]
    InvalidPlayerName { name: String },
    #[error("cards not found in hand: {ids:?}")]
    CardsNotFound { ids: Vec<Uuid> },
    #[error("duplicate card ids in request: {ids:?}")]
    DuplicateCardIds { ids: Vec<Uuid> },
    #[error("invalid lead card info: a wild card needs a color and only a wild card may have one")]
    InvalidLeadCardInfo,
    #[error("at least one card must be given in a play")]
    EmptyPlay,
    #[error("only one card can be played at a time")]
    MultiCardPlay,
    #[error("non-wild-card play must match the lead color, number or effect")]
    IllegalPlay,
    #[error("not your turn")]
    OutOfTurnPlay,
    #[error("a wild card play must choose a color")]
    MissingChosenColor,
    #[error("only a wild card play may choose a color")]
    UnexpectedChosenColor,
    #[error("last play must be a number card")]
    NonNumberLastPlay,
    #[error("unknown rule: {rule}")]
    UnknownRule { rule: String },
    #[error("rule {rule} must be {expected}")]
    RuleType { rule: String, expected: String },
    #[error("rule {rule} must be in range [{min}, {max}], got: {got}")]
    RuleRange {
        rule: String,
        min: i64,
        max: i64,
        got: i64,
    },
    #[error("not enough cards to draw")]
    PileExhausted,
}

impl GameError {
    /// Whether the error names something that doesn't exist, as opposed to a
    /// rejected-but-well-addressed request. Transports map this to 404.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::PlayerNotFound { .. })
    }

    /// Whether the request was fine but the game state forbids it right now.
    /// Transports map this to 409.
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyStarted
                | Self::NotStarted
                | Self::NotEnoughPlayers { .. }
                | Self::CapacityReached
                | Self::JoinAfterStart { .. }
                | Self::OutOfTurnPlay
                | Self::PileExhausted
        )
    }
}
