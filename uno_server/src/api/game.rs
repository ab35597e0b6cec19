//! Game command handlers.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use log::info;
use serde::Deserialize;
use serde_json::{Map, Value};
use uno_engine::{CardColor, GameError, GameStateSnapshot};
use uuid::Uuid;

use super::{ApiError, AppState, PlayerNameQuery};

/// `GET /api/game`: point-in-time state snapshot.
///
/// Hands are never included; players receive their own cards over their
/// subscription stream.
pub async fn get_state(State(state): State<AppState>) -> Json<GameStateSnapshot> {
    Json(state.game.snapshot())
}

/// `POST /api/game/start`
pub async fn start(
    State(state): State<AppState>,
    Query(query): Query<PlayerNameQuery>,
) -> Result<StatusCode, ApiError> {
    let name = query.require()?;
    state.game.start(name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/game/stop`
pub async fn stop(
    State(state): State<AppState>,
    Query(query): Query<PlayerNameQuery>,
) -> Result<StatusCode, ApiError> {
    let name = query.require()?;
    state.game.stop(name)?;
    Ok(StatusCode::NO_CONTENT)
}

/// `PUT /api/game/rules`: partial rule update.
///
/// The body is a JSON object whose keys are rule names; unknown keys, wrong
/// types, and out-of-range values reject the whole batch.
pub async fn set_rules(
    State(state): State<AppState>,
    Query(query): Query<PlayerNameQuery>,
    Json(updates): Json<Map<String, Value>>,
) -> Result<StatusCode, ApiError> {
    let operator = query.operator()?;
    state.game.update_rules(&updates, operator)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct PlayRequest {
    pub card_ids: Vec<Uuid>,
    #[serde(default)]
    pub chosen_color: Option<CardColor>,
}

/// `POST /api/game/play`
pub async fn play(
    State(state): State<AppState>,
    Query(query): Query<PlayerNameQuery>,
    Json(request): Json<PlayRequest>,
) -> Result<StatusCode, ApiError> {
    let name = query.require()?;
    state
        .game
        .play_cards(name, &request.card_ids, request.chosen_color)?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
pub struct DrawQuery {
    #[serde(default = "default_draw_count")]
    pub count: usize,
}

fn default_draw_count() -> usize {
    1
}

/// `POST /api/game/draw?player_name=NAME&count=N`
///
/// The drawn cards reach the player through their subscription stream; the
/// response only signals success. Exhausting both piles stops the game and
/// surfaces as a conflict here.
pub async fn draw(
    State(state): State<AppState>,
    Query(query): Query<PlayerNameQuery>,
    Query(draw_query): Query<DrawQuery>,
) -> Result<StatusCode, ApiError> {
    let name = query.require()?;
    if !state.game.started() {
        return Err(ApiError(GameError::NotStarted));
    }
    let player = state.game.get_player(name)?;
    match state.game.draw_card(draw_query.count, Some(player.as_ref()), true) {
        Some(drawn) => {
            info!("player {name} drew {} card(s)", drawn.len());
            Ok(StatusCode::NO_CONTENT)
        }
        None => Err(ApiError(GameError::PileExhausted)),
    }
}

/// `DELETE /api/game/players/{name}`
pub async fn kick_player(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<PlayerNameQuery>,
) -> Result<StatusCode, ApiError> {
    let operator = query.operator()?;
    state.game.kick_out_player(&name, operator)?;
    Ok(StatusCode::NO_CONTENT)
}
