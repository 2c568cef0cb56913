//! REST API endpoint handlers.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/health` | Liveness, session count, uptime |
//! | `POST` | `/api/start-new-game` | One random picture for single-player mode |
//! | `POST` | `/api/end-game` | Distance between a guess and a picture |
//! | `GET` | `/api/game/scoreboard/{gameId}` | Ranked scoreboard of a session |
//! | `GET` | `/api/sessions` | Summaries of live sessions |

use std::sync::Arc;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use chrono::Utc;
use rhenaguesser_types::{Coordinate, PictureId, ScoreEntry, SessionId, SessionSummary};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / response bodies
// ---------------------------------------------------------------------------

/// Response of `POST /api/start-new-game`.
#[derive(Debug, Serialize, Deserialize)]
pub struct NewGameResponse {
    /// Picture to show the player.
    #[serde(rename = "locationId")]
    pub location_id: PictureId,
}

/// Body of `POST /api/end-game`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndGameRequest {
    /// Picture the player was shown.
    #[serde(rename = "originPicId")]
    pub origin_pic_id: PictureId,
    /// Where the player guessed.
    #[serde(rename = "guessPosition")]
    pub guess_position: Coordinate,
}

/// Response of `POST /api/end-game`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EndGameResponse {
    /// Error distance rounded to whole meters.
    pub distance_meters: u64,
    /// Where the picture was taken.
    #[serde(rename = "originPoint")]
    pub origin_point: Coordinate,
}

/// Response of `GET /api/game/scoreboard/{gameId}`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ScoreboardResponse {
    /// Ranked scoreboard.
    pub scores: Vec<ScoreEntry>,
}

/// Response of `GET /api/sessions`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionsResponse {
    /// Live sessions sorted by code.
    pub sessions: Vec<SessionSummary>,
}

/// Response of `GET /health`.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Always `ok` while the server answers.
    pub status: String,
    /// Number of live sessions.
    pub sessions: usize,
    /// Seconds since startup.
    pub uptime_secs: i64,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// Report liveness.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_owned(),
        sessions: state.coordinator.session_count().await,
        uptime_secs: Utc::now().signed_duration_since(state.started_at).num_seconds(),
    })
}

/// Pick one picture for a single-player round.
pub async fn start_new_game(
    State(state): State<Arc<AppState>>,
) -> Result<Json<NewGameResponse>, ApiError> {
    let location_id = state.coordinator.random_location().await?;
    info!(location = %location_id, "single-player round started");
    Ok(Json(NewGameResponse { location_id }))
}

/// Score a single-player guess.
pub async fn end_game(
    State(state): State<Arc<AppState>>,
    body: Result<Json<EndGameRequest>, JsonRejection>,
) -> Result<Json<EndGameResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let (distance_meters, origin_point) = state
        .coordinator
        .score_single_guess(&request.origin_pic_id, request.guess_position)
        .await
        .map_err(ApiError::from_locate)?;
    Ok(Json(EndGameResponse {
        distance_meters,
        origin_point,
    }))
}

/// Scoreboard of a multiplayer session.
pub async fn scoreboard(
    State(state): State<Arc<AppState>>,
    Path(game_id): Path<String>,
) -> Result<Json<ScoreboardResponse>, ApiError> {
    let scores = state
        .coordinator
        .scoreboard(&SessionId::from(game_id))
        .await?;
    Ok(Json(ScoreboardResponse { scores }))
}

/// Summaries of every live session.
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<SessionsResponse> {
    Json(SessionsResponse {
        sessions: state.coordinator.sessions().await,
    })
}
