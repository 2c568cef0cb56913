//! Shared application state for the game server.

use chrono::{DateTime, Utc};
use rhenaguesser_core::Coordinator;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`](std::sync::Arc) and injected via Axum's `State`
/// extractor. The coordinator is itself a set of shared handles, so every
/// request and every socket task sees the same sessions.
#[derive(Clone)]
pub struct AppState {
    /// Session coordinator behind the WebSocket and REST endpoints.
    pub coordinator: Coordinator,
    /// When the server started.
    pub started_at: DateTime<Utc>,
}

impl AppState {
    /// Wrap a coordinator.
    pub fn new(coordinator: Coordinator) -> Self {
        Self {
            coordinator,
            started_at: Utc::now(),
        }
    }
}
