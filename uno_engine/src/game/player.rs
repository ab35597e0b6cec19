//! The per-player aggregate: hand, outbound queue, connectivity bookkeeping.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::deck::Card;
use crate::errors::GameError;
use crate::events::ServerEvent;

pub struct Player {
    name: String,
    state: Mutex<PlayerState>,
}

struct PlayerState {
    cards: Vec<Card>,
    queue: mpsc::Sender<ServerEvent>,
    /// Receiving end of the queue, parked until a transport subscribes.
    /// Events enqueued before the first subscription are retained here.
    parked_receiver: Option<mpsc::Receiver<ServerEvent>>,
    queue_capacity: usize,
    /// Written only by the disconnect watcher.
    connected: bool,
    /// Identifies the live transport attachment, if any.
    subscription: Option<Uuid>,
    /// Set when an event send begins; cleared when it completes. A stale
    /// value is the watcher's signal for a broken transport.
    last_pending: Option<Instant>,
    last_sent: Option<Instant>,
}

/// What one watcher tick concluded about a player.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConnectivityChange {
    Unchanged,
    Connected,
    Disconnected,
}

impl Player {
    pub(crate) fn new(name: &str, queue_capacity: usize) -> Self {
        let (queue, receiver) = mpsc::channel(queue_capacity);
        debug!("player {name} created");
        Self {
            name: name.to_string(),
            state: Mutex::new(PlayerState {
                cards: Vec::new(),
                queue,
                parked_receiver: Some(receiver),
                queue_capacity,
                connected: false,
                subscription: None,
                last_pending: None,
                last_sent: None,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    // A poisoned player lock would only mean a panic mid-mutation elsewhere;
    // the state itself is still the best available, so keep going.
    fn lock(&self) -> MutexGuard<'_, PlayerState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn connected(&self) -> bool {
        self.lock().connected
    }

    pub fn hand_len(&self) -> usize {
        self.lock().cards.len()
    }

    pub fn hand(&self) -> Vec<Card> {
        self.lock().cards.clone()
    }

    /// Pushes one event into the player's bounded queue without blocking.
    /// A full queue drops the event (a stalled transport must never stall
    /// gameplay for others); a closed queue means the transport went away.
    pub fn enqueue(&self, event: ServerEvent) {
        let state = self.lock();
        match state.queue.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(event)) => {
                warn!(
                    "player {} queue full, dropping {} event",
                    self.name,
                    event.name()
                );
            }
            Err(mpsc::error::TrySendError::Closed(event)) => {
                debug!(
                    "player {} queue closed, dropping {} event",
                    self.name,
                    event.name()
                );
            }
        }
    }

    /// Snapshot event of this player's current hand, for this player only.
    pub fn cards_event(&self) -> ServerEvent {
        ServerEvent::Cards(self.lock().cards.clone())
    }

    pub(crate) fn add_to_hand(&self, cards: &[Card]) {
        let mut state = self.lock();
        state.cards.extend_from_slice(cards);
        let snapshot = ServerEvent::Cards(state.cards.clone());
        drop(state);
        self.enqueue(snapshot);
    }

    /// Clones the named cards out of the hand without removing them.
    /// Same all-or-nothing id checks as [`Player::give_out_cards`].
    pub fn peek_cards(&self, ids: &[Uuid]) -> Result<Vec<Card>, GameError> {
        let state = self.lock();
        check_requested_ids(&state.cards, ids)?;
        Ok(state
            .cards
            .iter()
            .filter(|card| ids.contains(&card.id()))
            .cloned()
            .collect())
    }

    /// Removes the named cards from the hand and returns them, preserving
    /// hand order for the remainder. All-or-nothing: if any id is absent or
    /// duplicated the hand is left untouched and the error names every
    /// offending id.
    pub fn give_out_cards(&self, ids: &[Uuid]) -> Result<Vec<Card>, GameError> {
        let mut state = self.lock();
        check_requested_ids(&state.cards, ids)?;
        let mut given = Vec::with_capacity(ids.len());
        let mut remaining = Vec::with_capacity(state.cards.len() - ids.len());
        for card in state.cards.drain(..) {
            if ids.contains(&card.id()) {
                given.push(card);
            } else {
                remaining.push(card);
            }
        }
        state.cards = remaining;
        Ok(given)
    }

    /// Attaches a transport: issues a fresh subscription token and hands out
    /// the queue's receiving end. The first subscription receives everything
    /// enqueued since the player was created; a re-subscription starts a new
    /// queue (the old receiver keeps whatever it had).
    pub fn subscribe(&self) -> (Uuid, mpsc::Receiver<ServerEvent>) {
        let mut state = self.lock();
        let token = Uuid::new_v4();
        state.subscription = Some(token);
        // A pending stamp left by the previous transport must not count
        // against the new one.
        state.last_pending = None;
        let receiver = match state.parked_receiver.take() {
            Some(receiver) => receiver,
            None => {
                let (queue, receiver) = mpsc::channel(state.queue_capacity);
                state.queue = queue;
                receiver
            }
        };
        info!("player {} subscribed (token: {token})", self.name);
        (token, receiver)
    }

    /// Scoped bookkeeping around sending one event to this player. Stamps
    /// "pending" now; [`MessageContext::complete`] clears it and stamps
    /// "sent". Dropping the context without completing leaves "pending" set,
    /// which is how the watcher detects a stuck transport.
    pub fn message_context(self: &Arc<Self>) -> MessageContext {
        self.lock().last_pending = Some(Instant::now());
        MessageContext {
            player: Arc::clone(self),
        }
    }

    /// Recomputes the connectivity flag from the subscription token and the
    /// pending timestamp. Clears the token on a transition to disconnected.
    pub(crate) fn refresh_connectivity(
        &self,
        now: Instant,
        timeout: Duration,
    ) -> ConnectivityChange {
        let mut state = self.lock();
        let connected = match (state.subscription, state.last_pending) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(_), Some(pending_since)) => now.duration_since(pending_since) < timeout,
        };
        if connected == state.connected {
            return ConnectivityChange::Unchanged;
        }
        state.connected = connected;
        if connected {
            ConnectivityChange::Connected
        } else {
            if let Some(token) = state.subscription.take() {
                info!("disconnected from player {} (token: {token})", self.name);
            }
            ConnectivityChange::Disconnected
        }
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.lock().connected = connected;
    }
}

fn check_requested_ids(cards: &[Card], ids: &[Uuid]) -> Result<(), GameError> {
    let mut seen = HashSet::with_capacity(ids.len());
    let duplicates: Vec<Uuid> = ids.iter().filter(|id| !seen.insert(**id)).copied().collect();
    if !duplicates.is_empty() {
        return Err(GameError::DuplicateCardIds { ids: duplicates });
    }
    let missing: Vec<Uuid> = ids
        .iter()
        .filter(|id| !cards.iter().any(|card| card.id() == **id))
        .copied()
        .collect();
    if !missing.is_empty() {
        return Err(GameError::CardsNotFound { ids: missing });
    }
    Ok(())
}

/// Owned guard for one in-flight event delivery; see
/// [`Player::message_context`].
#[must_use]
pub struct MessageContext {
    player: Arc<Player>,
}

impl MessageContext {
    /// Marks the delivery as completed: clears "pending", stamps "sent".
    pub fn complete(self) {
        let mut state = self.player.lock();
        state.last_pending = None;
        state.last_sent = Some(Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::create_deck;

    fn player_with_hand(count: usize) -> Player {
        let player = Player::new("alice", 8);
        let deck = create_deck();
        player.lock().cards.extend_from_slice(&deck[..count]);
        player
    }

    #[test]
    fn test_give_out_cards_preserves_order() {
        let player = player_with_hand(5);
        let hand = player.hand();
        let given = player.give_out_cards(&[hand[1].id(), hand[3].id()]).unwrap();
        assert_eq!(given, vec![hand[1].clone(), hand[3].clone()]);
        assert_eq!(
            player.hand(),
            vec![hand[0].clone(), hand[2].clone(), hand[4].clone()]
        );
    }

    #[test]
    fn test_give_out_cards_is_all_or_nothing() {
        let player = player_with_hand(3);
        let hand = player.hand();
        let stranger_a = Uuid::new_v4();
        let stranger_b = Uuid::new_v4();
        let err = player
            .give_out_cards(&[hand[0].id(), stranger_a, stranger_b])
            .unwrap_err();
        assert_eq!(
            err,
            GameError::CardsNotFound {
                ids: vec![stranger_a, stranger_b]
            }
        );
        assert_eq!(player.hand(), hand);
    }

    #[test]
    fn test_give_out_cards_rejects_duplicate_ids() {
        let player = player_with_hand(3);
        let id = player.hand()[0].id();
        let err = player.give_out_cards(&[id, id]).unwrap_err();
        assert_eq!(err, GameError::DuplicateCardIds { ids: vec![id] });
        assert_eq!(player.hand_len(), 3);
    }

    #[test]
    fn test_peek_cards_does_not_remove() {
        let player = player_with_hand(3);
        let id = player.hand()[2].id();
        let peeked = player.peek_cards(&[id]).unwrap();
        assert_eq!(peeked.len(), 1);
        assert_eq!(player.hand_len(), 3);
    }

    #[test]
    fn test_message_context_stamps_timestamps() {
        let player = Arc::new(Player::new("alice", 8));
        assert!(player.lock().last_pending.is_none());

        let context = player.message_context();
        assert!(player.lock().last_pending.is_some());
        assert!(player.lock().last_sent.is_none());

        context.complete();
        assert!(player.lock().last_pending.is_none());
        assert!(player.lock().last_sent.is_some());
    }

    #[test]
    fn test_abandoned_message_context_leaves_pending_set() {
        let player = Arc::new(Player::new("alice", 8));
        drop(player.message_context());
        assert!(player.lock().last_pending.is_some());
    }

    #[test]
    fn test_queue_overflow_drops_newest() {
        let player = Player::new("alice", 2);
        for i in 0..5 {
            player.enqueue(ServerEvent::notification("n", format!("{i}")));
        }
        let (_token, mut receiver) = player.subscribe();
        let mut delivered = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            delivered.push(event);
        }
        assert_eq!(
            delivered,
            vec![
                ServerEvent::notification("n", "0"),
                ServerEvent::notification("n", "1"),
            ]
        );
    }

    #[test]
    fn test_subscribe_retains_earlier_events() {
        let player = Player::new("alice", 8);
        player.enqueue(ServerEvent::notification("hello", "before subscribe"));
        let (_token, mut receiver) = player.subscribe();
        assert_eq!(
            receiver.try_recv().ok(),
            Some(ServerEvent::notification("hello", "before subscribe"))
        );
    }

    #[test]
    fn test_resubscribe_replaces_queue() {
        let player = Player::new("alice", 8);
        let (first_token, first_receiver) = player.subscribe();
        drop(first_receiver);
        let (second_token, mut receiver) = player.subscribe();
        assert_ne!(first_token, second_token);
        player.enqueue(ServerEvent::notification("n", "after resubscribe"));
        assert!(receiver.try_recv().is_ok());
    }

    #[test]
    fn test_connectivity_transitions() {
        let player = Arc::new(Player::new("alice", 8));
        let timeout = Duration::from_secs(5);

        // No subscription: stays disconnected.
        assert_eq!(
            player.refresh_connectivity(Instant::now(), timeout),
            ConnectivityChange::Unchanged
        );

        let (_token, _receiver) = player.subscribe();
        assert_eq!(
            player.refresh_connectivity(Instant::now(), timeout),
            ConnectivityChange::Connected
        );
        assert!(player.connected());

        // A pending send older than the timeout flips the player to
        // disconnected and clears the token.
        drop(player.message_context());
        let future = Instant::now() + timeout * 2;
        assert_eq!(
            player.refresh_connectivity(future, timeout),
            ConnectivityChange::Disconnected
        );
        assert!(!player.connected());
        assert!(player.lock().subscription.is_none());
    }

    #[test]
    fn test_resubscribe_clears_stale_pending_stamp() {
        let player = Arc::new(Player::new("alice", 8));
        let (_token, _receiver) = player.subscribe();
        // The transport dies mid-send, leaving "pending" set.
        drop(player.message_context());
        assert!(player.lock().last_pending.is_some());

        // A new transport attaches before the watcher notices. Its clean
        // slate must not inherit the dead transport's stamp, or the watcher
        // would disconnect it before it delivered anything.
        let (_token, _receiver) = player.subscribe();
        assert!(player.lock().last_pending.is_none());
        assert_eq!(
            player.refresh_connectivity(Instant::now(), Duration::ZERO),
            ConnectivityChange::Connected
        );
    }

    #[test]
    fn test_fresh_pending_send_stays_connected() {
        let player = Arc::new(Player::new("alice", 8));
        let (_token, _receiver) = player.subscribe();
        let _context = player.message_context();
        assert_eq!(
            player.refresh_connectivity(Instant::now(), Duration::from_secs(5)),
            ConnectivityChange::Connected
        );
    }
}
