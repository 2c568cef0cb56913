//! `WebSocket` endpoint for multiplayer sessions.
//!
//! Clients connect to `GET /api/ws` and exchange JSON text frames
//! discriminated by `action`. The socket is split: a writer task drains the
//! connection's outbox into the sink, while this task reads frames and
//! hands them to the coordinator one at a time. A frame that takes long
//! to handle (game creation waits on the picture provider) therefore never
//! holds up broadcasts from other players.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use rhenaguesser_core::Connection;
use rhenaguesser_types::ServerEvent;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a multiplayer `WebSocket` connection.
///
/// # Route
///
/// `GET /api/ws`
pub async fn ws_session(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Handle the `WebSocket` lifecycle until the client goes away.
async fn handle_ws(socket: WebSocket, state: Arc<AppState>) {
    let (mut sink, mut stream) = socket.split();
    let (mut connection, mut outbox) = Connection::open();
    let connection_id = connection.id();
    debug!(connection = %connection_id, "WebSocket client connected");

    let writer = tokio::spawn(async move {
        while let Some(event) = outbox.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(j) => j,
                Err(e) => {
                    warn!(action = event.action(), "Failed to serialize event: {e}");
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                debug!(connection = %connection_id, "WebSocket client disconnected (send failed)");
                return;
            }
        }
    });

    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Text(text)) => {
                state
                    .coordinator
                    .handle_text(&mut connection, text.as_str())
                    .await;
            }
            Ok(Message::Binary(_)) => {
                connection.send(ServerEvent::error(
                    "Invalid message format: expected a JSON text frame",
                ));
            }
            Ok(Message::Close(_)) => break,
            Ok(Message::Ping(_) | Message::Pong(_)) => {
                // Pongs are answered by the protocol layer.
            }
            Err(e) => {
                debug!(connection = %connection_id, "WebSocket error: {e}");
                break;
            }
        }
    }

    state.coordinator.disconnect(connection).await;
    writer.abort();
    debug!(connection = %connection_id, "WebSocket client disconnected");
}
