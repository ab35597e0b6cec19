//! The game aggregate: roster, piles, turn pointer, rule set.
//!
//! One mutex guards the whole aggregate. Every public operation acquires it
//! for its full duration, including any broadcast at the end, so no observer
//! ever sees a broadcast reflect two interleaved mutations. A player's own
//! lock may be taken while the game lock is held (never the reverse); all
//! internal composition happens on the already-locked state, so each public
//! operation locks the game exactly once.

pub mod player;
pub mod watcher;

pub use player::{ConnectivityChange, MessageContext, Player};

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use log::{debug, info, warn};
use rand::seq::SliceRandom;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::constants::{MIN_PLAYER_CAPACITY, is_valid_player_name};
use crate::deck::{Card, CardColor, create_deck};
use crate::errors::GameError;
use crate::events::{GameStateSnapshot, PlayerSummary, ServerEvent};
use crate::play::check_play;
use crate::rules::GameRules;

/// Card-conservation accounting across the piles and all hands. Logged on
/// stop and relied on by tests: the total is invariant while a game runs.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct CardCensus {
    pub draw_pile: usize,
    pub discard_pile: usize,
    pub hands: usize,
}

impl CardCensus {
    pub fn total(&self) -> usize {
        self.draw_pile + self.discard_pile + self.hands
    }
}

pub struct Game {
    config: EngineConfig,
    state: Mutex<GameState>,
}

struct GameState {
    /// Roster order is turn order.
    players: Vec<Arc<Player>>,
    started: bool,
    rules: GameRules,
    draw_pile: Vec<Card>,
    discard_pile: Vec<Card>,
    /// Meaningful only while started.
    current_player_index: usize,
    lead_card: Option<Card>,
    /// Set if and only if the lead card is wild.
    lead_color: Option<CardColor>,
}

impl Game {
    pub fn new(config: EngineConfig) -> Self {
        debug!("game created");
        Self {
            config,
            state: Mutex::new(GameState {
                players: Vec::new(),
                started: false,
                rules: GameRules::default(),
                draw_pile: Vec::new(),
                discard_pile: Vec::new(),
                current_player_index: 0,
                lead_card: None,
                lead_color: None,
            }),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Same policy as the player lock: a poisoned game lock is survivable,
    // recover the guard and carry on.
    fn lock_state(&self) -> MutexGuard<'_, GameState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn started(&self) -> bool {
        self.lock_state().started
    }

    pub fn rules(&self) -> GameRules {
        self.lock_state().rules.clone()
    }

    pub fn snapshot(&self) -> GameStateSnapshot {
        self.lock_state().snapshot()
    }

    pub fn state_event(&self) -> ServerEvent {
        ServerEvent::GameState(self.snapshot())
    }

    pub fn census(&self) -> CardCensus {
        self.lock_state().census()
    }

    /// Pushes one event into every player's queue under a single atomic
    /// section, so all players observe the same event order.
    pub fn broadcast(&self, event: ServerEvent) {
        self.lock_state().broadcast(&event);
    }

    pub fn get_player(&self, name: &str) -> Result<Arc<Player>, GameError> {
        self.lock_state()
            .find_player(name)
            .ok_or_else(|| GameError::PlayerNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the named player, creating a seat on first join. Joining is
    /// only possible while the game is pending and below capacity.
    pub fn join_player(&self, name: &str) -> Result<Arc<Player>, GameError> {
        if !is_valid_player_name(name) {
            return Err(GameError::InvalidPlayerName {
                name: name.to_string(),
            });
        }
        let mut state = self.lock_state();
        if let Some(player) = state.find_player(name) {
            return Ok(player);
        }
        if state.started {
            return Err(GameError::JoinAfterStart {
                name: name.to_string(),
            });
        }
        if state.players.len() >= state.rules.player_capacity {
            return Err(GameError::CapacityReached);
        }
        let player = Arc::new(Player::new(name, self.config.queue_capacity));
        state.players.push(Arc::clone(&player));
        info!("player {name} joined the lobby");
        state.broadcast_snapshot();
        Ok(player)
    }

    pub fn kick_out_player(
        &self,
        target_name: &str,
        operator_name: Option<&str>,
    ) -> Result<(), GameError> {
        let mut state = self.lock_state();
        let index = state
            .players
            .iter()
            .position(|p| p.name() == target_name)
            .ok_or_else(|| GameError::PlayerNotFound {
                name: target_name.to_string(),
            })?;
        let player = state.players.remove(index);
        player.set_connected(false);
        player.enqueue(ServerEvent::EndOfConnection {
            message: format_optional_operator("Sorry, you are kicked out", operator_name),
        });
        info!(
            "{}",
            format_optional_operator(&format!("player {target_name} is kicked out"), operator_name)
        );
        if state.started {
            if state.players.is_empty() {
                state.force_stop(None);
                return Ok(());
            }
            // Keep the turn pointer on the same player, or wrap it if the
            // kicked player held the last seat.
            if index < state.current_player_index {
                state.current_player_index -= 1;
            }
            if state.current_player_index >= state.players.len() {
                state.current_player_index = 0;
            }
        }
        state.broadcast_snapshot();
        Ok(())
    }

    /// Applies a partial rule update. Validation is two-phase: nothing is
    /// committed unless every proposed key passes its validator. Shrinking
    /// `player_capacity` below the roster size evicts excess players from the
    /// end of the roster, then broadcasts the new state once.
    pub fn update_rules(
        &self,
        updates: &Map<String, Value>,
        operator_name: Option<&str>,
    ) -> Result<(), GameError> {
        let mut state = self.lock_state();
        state.rules = state.rules.with_updates(updates)?;

        let message = format_optional_operator("Game rules updated", operator_name);
        info!("{message}");
        state.broadcast(&ServerEvent::notification("Rules Updated", message));

        if updates.contains_key("player_capacity") {
            let capacity = state.rules.player_capacity;
            if state.players.len() > capacity {
                while state.players.len() > capacity {
                    if let Some(excess) = state.players.pop() {
                        info!("player {} evicted by the capacity change", excess.name());
                        excess.enqueue(ServerEvent::EndOfConnection {
                            message: "Sorry, you are kicked out due to a recent rule change."
                                .to_string(),
                        });
                        excess.set_connected(false);
                    }
                }
                if state.started && state.current_player_index >= state.players.len() {
                    state.current_player_index = 0;
                }
                state.broadcast_snapshot();
            }
        }
        Ok(())
    }

    /// Records the lead card, plus the chosen color when (and only when) the
    /// card is wild.
    pub fn set_lead_card_info(
        &self,
        lead_card: Card,
        lead_color: Option<CardColor>,
    ) -> Result<(), GameError> {
        self.lock_state().set_lead_info(lead_card, lead_color)
    }

    /// Draws `count` cards one at a time; see [`GameState::draw`] for the
    /// reshuffle and exhaustion semantics. Returns `None` when the piles are
    /// exhausted, in which case the game has already been force-stopped.
    pub fn draw_card(
        &self,
        count: usize,
        player: Option<&Player>,
        allow_shuffle: bool,
    ) -> Option<Vec<Card>> {
        self.lock_state().draw(count, player, allow_shuffle)
    }

    /// Starts the game: fresh shuffled draw pile, initial deal, a number
    /// card as the lead, turn pointer on seat 0. On pile exhaustion the game
    /// has already been force-stopped and notified; hands dealt earlier in
    /// the same call are deliberately left in place (best-effort deal, cards
    /// are conserved either way).
    pub fn start(&self, initiator_name: &str) -> Result<(), GameError> {
        let mut state = self.lock_state();
        if state.started {
            return Err(GameError::AlreadyStarted);
        }
        if state.players.len() < MIN_PLAYER_CAPACITY {
            return Err(GameError::NotEnoughPlayers {
                minimum: MIN_PLAYER_CAPACITY,
            });
        }

        if state.rules.shuffle_players {
            state.players.shuffle(&mut rand::rng());
        }

        state.draw_pile = create_deck();
        state.draw_pile.shuffle(&mut rand::rng());
        state.discard_pile.clear();
        state.lead_card = None;
        state.lead_color = None;

        let initial_hand_size = state.rules.initial_hand_size;
        let roster: Vec<Arc<Player>> = state.players.clone();
        for player in &roster {
            if state
                .draw(initial_hand_size, Some(player.as_ref()), false)
                .is_none()
            {
                warn!("deck exhausted while dealing, start aborted");
                return Err(GameError::PileExhausted);
            }
        }

        loop {
            let Some(drawn) = state.draw(1, None, false) else {
                warn!("deck exhausted while drawing the lead card, start aborted");
                return Err(GameError::PileExhausted);
            };
            let Some(card) = drawn.into_iter().next() else {
                return Err(GameError::PileExhausted);
            };
            let is_number = card.is_number();
            // Function and wild cards drawn here stay buried in the discard
            // pile; only a number card may open the game.
            state.discard_pile.push(card.clone());
            if is_number {
                state.set_lead_info(card, None)?;
                break;
            }
        }

        state.current_player_index = 0;
        state.started = true;

        let message = format!("Game started by player {initiator_name}.");
        info!("{message}");
        state.broadcast(&ServerEvent::notification("Started!", message));
        state.broadcast_snapshot();
        Ok(())
    }

    pub fn stop(&self, initiator_name: &str) -> Result<(), GameError> {
        let mut state = self.lock_state();
        if !state.started {
            return Err(GameError::NotStarted);
        }
        state.force_stop(Some(initiator_name));
        Ok(())
    }

    /// Plays cards from a player's hand against the current lead: one atomic
    /// operation covering legality check, hand removal, discard, lead update,
    /// and turn advance. Emptying the hand wins and stops the game.
    pub fn play_cards(
        &self,
        player_name: &str,
        card_ids: &[Uuid],
        chosen_color: Option<CardColor>,
    ) -> Result<(), GameError> {
        let mut state = self.lock_state();
        if !state.started {
            return Err(GameError::NotStarted);
        }
        let index = state
            .players
            .iter()
            .position(|p| p.name() == player_name)
            .ok_or_else(|| GameError::PlayerNotFound {
                name: player_name.to_string(),
            })?;
        if index != state.current_player_index {
            return Err(GameError::OutOfTurnPlay);
        }
        let player = Arc::clone(&state.players[index]);

        let play = player.peek_cards(card_ids)?;
        let lead_card = state.lead_card.clone().ok_or(GameError::NotStarted)?;
        let lead_color = state
            .effective_lead_color()
            .ok_or(GameError::InvalidLeadCardInfo)?;
        check_play(&play, lead_color, &lead_card)?;

        let played_card = play[0].clone();
        match (played_card.is_wild(), chosen_color) {
            (true, None) => return Err(GameError::MissingChosenColor),
            (false, Some(_)) => return Err(GameError::UnexpectedChosenColor),
            _ => {}
        }
        if !state.rules.any_last_play
            && player.hand_len() == play.len()
            && !played_card.is_number()
        {
            return Err(GameError::NonNumberLastPlay);
        }

        let given = player.give_out_cards(card_ids)?;
        state.discard_pile.extend(given);
        state.set_lead_info(played_card, chosen_color)?;
        player.enqueue(player.cards_event());

        if player.hand_len() == 0 {
            let message = format!("Player {player_name} wins!");
            info!("{message}");
            state.broadcast(&ServerEvent::notification("Wins!", message));
            state.force_stop(None);
        } else {
            state.current_player_index = (index + 1) % state.players.len();
            state.broadcast_snapshot();
        }
        Ok(())
    }

    /// One watcher pass: recompute every player's connectivity, evict
    /// disconnected lobby players, and broadcast a single snapshot when
    /// anything changed. Returns whether a broadcast happened.
    pub fn watcher_tick(&self) -> bool {
        let mut state = self.lock_state();
        let now = Instant::now();
        let timeout = self.config.player_timeout;
        let started = state.started;

        let mut changed = false;
        let mut evicted: Vec<String> = Vec::new();
        for player in &state.players {
            match player.refresh_connectivity(now, timeout) {
                ConnectivityChange::Unchanged => {}
                ConnectivityChange::Connected => changed = true,
                ConnectivityChange::Disconnected => {
                    changed = true;
                    // A seat in a running game is preserved for reconnection;
                    // a lobby seat is not.
                    if !started {
                        evicted.push(player.name().to_string());
                    }
                }
            }
        }
        if !evicted.is_empty() {
            state
                .players
                .retain(|p| !evicted.iter().any(|name| name == p.name()));
            for name in &evicted {
                info!("removed disconnected player {name} from the lobby");
            }
        }
        if changed {
            state.broadcast_snapshot();
        }
        changed
    }
}

impl GameState {
    fn find_player(&self, name: &str) -> Option<Arc<Player>> {
        self.players
            .iter()
            .find(|p| p.name() == name)
            .map(Arc::clone)
    }

    fn broadcast(&self, event: &ServerEvent) {
        for player in &self.players {
            player.enqueue(event.clone());
        }
    }

    fn broadcast_snapshot(&self) {
        self.broadcast(&ServerEvent::GameState(self.snapshot()));
    }

    fn snapshot(&self) -> GameStateSnapshot {
        let started = self.started;
        GameStateSnapshot {
            started,
            rules: self.rules.clone(),
            draw_pile_size: started.then_some(self.draw_pile.len()),
            discard_pile_size: started.then_some(self.discard_pile.len()),
            players: self
                .players
                .iter()
                .map(|player| PlayerSummary {
                    name: player.name().to_string(),
                    connected: player.connected(),
                    card_count: started.then(|| player.hand_len()),
                })
                .collect(),
            current_player_index: started.then_some(self.current_player_index),
            lead_card: self.lead_card.clone(),
            lead_color: self.lead_color,
        }
    }

    fn census(&self) -> CardCensus {
        CardCensus {
            draw_pile: self.draw_pile.len(),
            discard_pile: self.discard_pile.len(),
            hands: self.players.iter().map(|p| p.hand_len()).sum(),
        }
    }

    /// The color the next play must match: the chosen color when the lead
    /// card is wild, the lead card's own color otherwise.
    fn effective_lead_color(&self) -> Option<CardColor> {
        self.lead_color
            .or_else(|| self.lead_card.as_ref().and_then(Card::color))
    }

    fn set_lead_info(
        &mut self,
        lead_card: Card,
        lead_color: Option<CardColor>,
    ) -> Result<(), GameError> {
        match (lead_card.is_wild(), lead_color) {
            (true, Some(color)) => self.lead_color = Some(color),
            (false, None) => self.lead_color = None,
            _ => return Err(GameError::InvalidLeadCardInfo),
        }
        self.lead_card = Some(lead_card);
        Ok(())
    }

    /// Draws `count` cards one at a time. An empty draw pile is refilled from
    /// the discard pile (shuffled) when `allow_shuffle` is set. If the piles
    /// still cannot satisfy the draw, the cards drawn so far by this call are
    /// pushed back, a "Not Enough Cards" notification is broadcast, the game
    /// is force-stopped, and `None` is returned; callers must abandon their
    /// own operation on that result.
    ///
    /// On success the drawn cards are appended to `player`'s hand (with a
    /// hand snapshot queued for that player alone) when one is given, and an
    /// updated game snapshot is broadcast to everyone. Centralizing this here
    /// keeps the failure semantics identical for every draw path.
    fn draw(
        &mut self,
        count: usize,
        player: Option<&Player>,
        allow_shuffle: bool,
    ) -> Option<Vec<Card>> {
        let mut drawn = Vec::with_capacity(count);
        for _ in 0..count {
            if self.draw_pile.is_empty() {
                if allow_shuffle && !self.discard_pile.is_empty() {
                    debug!(
                        "reshuffling {} discarded cards into the draw pile",
                        self.discard_pile.len()
                    );
                    self.draw_pile = std::mem::take(&mut self.discard_pile);
                    self.draw_pile.shuffle(&mut rand::rng());
                }
                if self.draw_pile.is_empty() {
                    // Undo the partial draw before reporting exhaustion.
                    self.draw_pile.extend(drawn.drain(..).rev());
                    self.broadcast(&ServerEvent::notification(
                        "Not Enough Cards",
                        "Not enough cards to draw...",
                    ));
                    self.force_stop(None);
                    return None;
                }
            }
            if let Some(card) = self.draw_pile.pop() {
                drawn.push(card);
            }
        }
        if let Some(player) = player {
            player.add_to_hand(&drawn);
        }
        self.broadcast_snapshot();
        Some(drawn)
    }

    /// Stops the game regardless of its current state. Used by [`Game::stop`]
    /// after its state check and directly by the exhaustion path.
    fn force_stop(&mut self, operator_name: Option<&str>) {
        self.started = false;
        let message = format_optional_operator("Game stopped", operator_name);
        info!("{message}");
        debug!("card census at stop: {:?}", self.census());
        self.broadcast(&ServerEvent::notification("Stopped!", message));
        self.broadcast_snapshot();
    }
}

fn format_optional_operator(message: &str, operator_name: Option<&str>) -> String {
    match operator_name {
        Some(name) => format!("{message} by {name}."),
        None => format!("{message}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_optional_operator() {
        assert_eq!(
            format_optional_operator("Game stopped", Some("alice")),
            "Game stopped by alice."
        );
        assert_eq!(format_optional_operator("Game stopped", None), "Game stopped.");
    }
}
