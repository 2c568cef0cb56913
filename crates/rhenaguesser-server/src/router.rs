//! Axum router construction for the game server.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS middleware enabled for the browser client.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /health` -- liveness and session count
/// - `GET /api/ws` -- multiplayer `WebSocket`
/// - `POST /api/start-new-game` -- single-player picture
/// - `POST /api/end-game` -- single-player scoring
/// - `GET /api/game/scoreboard/{gameId}` -- multiplayer scoreboard
/// - `GET /api/sessions` -- live session summaries
///
/// CORS allows any origin; the client is served from a different host.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        // WebSocket
        .route("/api/ws", get(ws::ws_session))
        // Single-player
        .route("/api/start-new-game", post(handlers::start_new_game))
        .route("/api/end-game", post(handlers::end_game))
        // Multiplayer queries
        .route("/api/game/scoreboard/{game_id}", get(handlers::scoreboard))
        .route("/api/sessions", get(handlers::list_sessions))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
