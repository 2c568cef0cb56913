//! HTTP and `WebSocket` surface of the RhenaGuesser game server.
//!
//! This crate exposes:
//!
//! - **`WebSocket` endpoint** (`/api/ws`) carrying the multiplayer
//!   protocol, handled by [`rhenaguesser_core::Coordinator`]
//! - **Single-player endpoints** (`/api/start-new-game`, `/api/end-game`)
//! - **Read-only queries** for scoreboards, live sessions and health
//!
//! All game state lives in the coordinator; handlers only translate
//! between HTTP and its methods.

pub mod error;
pub mod handlers;
pub mod router;
pub mod server;
pub mod state;
pub mod ws;

pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerError, listen_addr, start_server};
pub use state::AppState;
