//! Listener setup and graceful shutdown.
//!
//! [`start_server`] takes the `server` section of the YAML configuration
//! as is, binds it and serves the router until `Ctrl-C`. Open `WebSocket`
//! connections are dropped on shutdown; their sessions die with the
//! process.

use std::net::SocketAddr;
use std::sync::Arc;

use rhenaguesser_core::ServerSection;
use tokio::net::TcpListener;
use tracing::info;

use crate::router::build_router;
use crate::state::AppState;

/// Errors that can occur when starting or running the game server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The configured address is malformed or cannot be bound.
    #[error("bind error: {0}")]
    Bind(String),

    /// The server encountered a fatal error while serving.
    #[error("serve error: {0}")]
    Serve(String),
}

/// Socket address named by `section`.
///
/// # Errors
///
/// Returns [`ServerError::Bind`] when `host` is not an IP literal.
pub fn listen_addr(section: &ServerSection) -> Result<SocketAddr, ServerError> {
    format!("{}:{}", section.host, section.port)
        .parse()
        .map_err(|e| ServerError::Bind(format!("invalid address {}: {e}", section.host)))
}

/// Serve the game until `Ctrl-C`.
///
/// # Errors
///
/// [`ServerError::Bind`] if the address is unusable, [`ServerError::Serve`]
/// if the accept loop fails.
pub async fn start_server(section: &ServerSection, state: Arc<AppState>) -> Result<(), ServerError> {
    let addr = listen_addr(section)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| ServerError::Bind(format!("bind failed on {addr}: {e}")))?;
    info!(%addr, sessions = state.coordinator.session_count().await, "Game server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Serve(e.to_string()))?;

    info!("Game server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until killed.
        std::future::pending::<()>().await;
    }
}
