//! HTTP/SSE API for the UNO session server.
//!
//! The API is a thin shell around [`uno_engine::Game`]: every handler
//! validates its inputs, calls one engine operation, and maps the result to
//! an HTTP response. Game state only ever flows to clients through the SSE
//! subscription stream; request/response bodies carry commands and errors.
//!
//! # Endpoints
//!
//! ```text
//! GET    /health                      - Server health status
//! GET    /api/game                    - Current game state snapshot
//! GET    /api/game/subscription       - Join and subscribe (SSE stream)
//! POST   /api/game/start              - Start the game
//! POST   /api/game/stop               - Stop the game
//! PUT    /api/game/rules              - Partial rule update
//! POST   /api/game/play               - Play cards from a hand
//! POST   /api/game/draw               - Draw cards into a hand
//! DELETE /api/game/players/{name}     - Kick a player out
//! ```
//!
//! Handlers identify the acting player through the `player_name` query
//! parameter, as there is no account system: a name is an identity.

mod game;
mod subscription;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use uno_engine::{Game, GameError};

/// Shared state handed to every handler. Cloning is cheap (one `Arc`).
#[derive(Clone)]
pub struct AppState {
    pub game: Arc<Game>,
}

/// Query parameter carrying the acting player's name.
///
/// Required for actions tied to a seat (play, draw, subscribe); optional for
/// operator-style actions (rules, kick, stop) where it only feeds the
/// attribution line in broadcast notifications.
#[derive(Deserialize)]
pub struct PlayerNameQuery {
    #[serde(default)]
    pub player_name: Option<String>,
}

impl PlayerNameQuery {
    /// Returns the name, validated, for endpoints that require a seat.
    fn require(&self) -> Result<&str, ApiError> {
        let name = self.player_name.as_deref().unwrap_or("");
        if !uno_engine::constants::is_valid_player_name(name) {
            return Err(ApiError(GameError::InvalidPlayerName {
                name: name.to_string(),
            }));
        }
        Ok(name)
    }

    /// Returns the name, validated, or `None` for anonymous operators.
    fn operator(&self) -> Result<Option<&str>, ApiError> {
        match self.player_name.as_deref() {
            None => Ok(None),
            Some(name) if uno_engine::constants::is_valid_player_name(name) => Ok(Some(name)),
            Some(name) => Err(ApiError(GameError::InvalidPlayerName {
                name: name.to_string(),
            })),
        }
    }
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Engine error carried across the handler boundary.
///
/// Status mapping: unknown players are 404, lifecycle and seating conflicts
/// are 409, everything else (bad plays, bad rule values, bad names) is 400.
pub struct ApiError(pub GameError);

impl From<GameError> for ApiError {
    fn from(error: GameError) -> Self {
        ApiError(error)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_not_found() {
            StatusCode::NOT_FOUND
        } else if self.0.is_state_conflict() {
            StatusCode::CONFLICT
        } else {
            StatusCode::BAD_REQUEST
        };
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    let game_routes = Router::new()
        .route("/game", get(game::get_state))
        .route("/game/subscription", get(subscription::subscribe))
        .route("/game/start", post(game::start))
        .route("/game/stop", post(game::stop))
        .route("/game/rules", put(game::set_rules))
        .route("/game/play", post(game::play))
        .route("/game/draw", post(game::draw))
        .route("/game/players/{name}", delete(game::kick_player));

    Router::new()
        .route("/health", get(health_check))
        .nest("/api", game_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
