//! Outbound events.
//!
//! Every player receives its own ordered stream of these through its bounded
//! queue. Per-player order equals the global order in which the game lock was
//! held, so all observers see the same history.

use serde::{Deserialize, Serialize};

use crate::deck::{Card, CardColor};
use crate::rules::GameRules;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Full public game state, broadcast to everyone.
    GameState(GameStateSnapshot),
    /// One player's own hand, sent to that player only.
    Cards(Vec<Card>),
    /// A human-readable announcement.
    Notification(Notification),
    /// Terminal message; the transport closes the stream after delivering it.
    EndOfConnection { message: String },
}

impl ServerEvent {
    pub fn notification(title: &str, message: impl Into<String>) -> Self {
        Self::Notification(Notification {
            title: title.to_string(),
            message: message.into(),
        })
    }

    /// Stable event name, used as the SSE `event:` field.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GameState(_) => "game_state",
            Self::Cards(_) => "cards",
            Self::Notification(_) => "notification",
            Self::EndOfConnection { .. } => "end_of_connection",
        }
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

/// The public view of the game. Pile sizes, card counts, and the turn pointer
/// are only exposed while the game is running.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameStateSnapshot {
    pub started: bool,
    pub rules: GameRules,
    pub draw_pile_size: Option<usize>,
    pub discard_pile_size: Option<usize>,
    pub players: Vec<PlayerSummary>,
    pub current_player_index: Option<usize>,
    pub lead_card: Option<Card>,
    pub lead_color: Option<CardColor>,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub name: String,
    pub connected: bool,
    pub card_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serde_shape() {
        let event = ServerEvent::notification("Started!", "Game started by player alice.");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "notification");
        assert_eq!(json["data"]["title"], "Started!");

        let parsed: ServerEvent = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, event);
    }

    #[test]
    fn test_event_names() {
        assert_eq!(ServerEvent::Cards(vec![]).name(), "cards");
        assert_eq!(
            ServerEvent::EndOfConnection {
                message: "bye".to_string()
            }
            .name(),
            "end_of_connection"
        );
    }
}
