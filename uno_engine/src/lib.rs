//! # UNO Engine
//!
//! An authoritative game-state engine for one UNO table: it validates player
//! actions against the active rules, mutates shared state under a fixed
//! locking discipline, and fans out consistent state snapshots to every
//! connected player.
//!
//! ## Architecture
//!
//! - [`Game`] is the single aggregate root. One mutex guards the roster,
//!   the piles, the rule set, and the turn pointer; every public operation
//!   holds it end to end, including the broadcast, so all players observe
//!   state changes in the same order.
//! - Each [`Player`] owns its hand and a bounded outbound event queue. The
//!   game only reaches into a player while holding that player's own lock,
//!   always nested inside the game lock.
//! - A background watcher task infers connectivity from stale message
//!   timestamps and evicts dead lobby players.
//!
//! The transport that drains player queues (HTTP/SSE, a bot harness, a test)
//! is external to this crate; the queue receiver is the sole hand-off point.
//!
//! ## Example
//!
//! ```
//! use uno_engine::{EngineConfig, Game};
//!
//! let game = Game::new(EngineConfig::default());
//! let alice = game.join_player("alice").unwrap();
//! let bob = game.join_player("bob").unwrap();
//! game.start("alice").unwrap();
//! assert!(game.started());
//! ```

pub mod config;
pub mod constants;
pub mod deck;
pub mod errors;
pub mod events;
pub mod game;
pub mod play;
pub mod rules;

pub use config::EngineConfig;
pub use deck::{Card, CardColor, FunctionEffect, WildEffect, create_deck};
pub use errors::GameError;
pub use events::{GameStateSnapshot, Notification, PlayerSummary, ServerEvent};
pub use game::{CardCensus, Game, MessageContext, Player, watcher};
pub use play::check_play;
pub use rules::GameRules;
