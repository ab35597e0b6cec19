//! SSE subscription stream.
//!
//! `GET /api/game/subscription?player_name=NAME` joins the named player (or
//! re-attaches to an existing seat) and streams their event queue as
//! server-sent events. Delivery bookkeeping is scoped per event: a
//! [`MessageContext`] opens when an event is pulled off the queue and
//! completes when the stream is polled for the next one, so a client that
//! stops reading leaves the context pending and the watcher eventually marks
//! the player disconnected.

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures_util::{Stream, stream};
use log::debug;
use std::sync::Arc;
use tokio::sync::mpsc::Receiver;
use uno_engine::{MessageContext, Player, ServerEvent};

use super::{ApiError, AppState, PlayerNameQuery};

struct StreamState {
    player: Arc<Player>,
    receiver: Receiver<ServerEvent>,
    in_flight: Option<MessageContext>,
    closing: bool,
}

pub async fn subscribe(
    State(state): State<AppState>,
    Query(query): Query<PlayerNameQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let name = query.require()?;
    let player = state.game.join_player(name)?;
    let (_token, receiver) = player.subscribe();

    // Seed the fresh subscription so the client can render immediately.
    player.enqueue(state.game.state_event());
    player.enqueue(player.cards_event());

    let stream = stream::unfold(
        StreamState {
            player,
            receiver,
            in_flight: None,
            closing: false,
        },
        |mut st| async move {
            // The previous event is out the door once the client asks for
            // the next one.
            if let Some(context) = st.in_flight.take() {
                context.complete();
            }
            if st.closing {
                return None;
            }
            let event = match st.receiver.recv().await {
                Some(event) => event,
                None => {
                    // Queue replaced by a re-subscription from the same name.
                    debug!("subscription stream for {} superseded", st.player.name());
                    return None;
                }
            };
            if matches!(event, ServerEvent::EndOfConnection { .. }) {
                st.closing = true;
            }
            st.in_flight = Some(st.player.message_context());
            let sse = Event::default().event(event.name()).json_data(&event);
            Some((sse, st))
        },
    );

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
