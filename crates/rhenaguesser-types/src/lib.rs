//! Shared type definitions for the RhenaGuesser game server.
//!
//! This crate is the single source of truth for the data model and the
//! WebSocket wire protocol. Types flow downstream to `TypeScript` via
//! `ts-rs` so the Nuxt client and the server agree on every payload.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe wrappers for session codes, player tokens, picture ids
//! - [`enums`] -- Session status and round phase
//! - [`structs`] -- Coordinates, pictures, players, guesses, scoreboard rows
//! - [`protocol`] -- Inbound [`ClientMessage`] and outbound [`ServerEvent`] unions

pub mod enums;
pub mod ids;
pub mod protocol;
pub mod structs;

// Re-export all public types at crate root for convenience.
pub use enums::{RoundPhase, SessionStatus};
pub use ids::{ConnectionId, PictureId, PlayerId, SessionId};
pub use protocol::{
    ClientMessage, CreateRequest, GetScoresRequest, GuessRequest, JoinRequest, ServerEvent,
    StartRequest,
};
pub use structs::{Coordinate, Guess, Picture, Player, ScoreEntry, SessionSummary};
