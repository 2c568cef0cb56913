//! Session coordination for the RhenaGuesser game server.
//!
//! Everything between a parsed WebSocket frame and the events pushed back
//! to clients lives here. The server crate only moves frames in and out.
//!
//! # Modules
//!
//! - [`coordinator`] -- Protocol handler: one entry point per inbound frame
//! - [`session`] -- Per-game state machine (roster, rounds, guesses)
//! - [`registry`] -- Live sessions, one lock per session
//! - [`topic`] -- Ordered fan-out to a session's subscribers
//! - [`scheduler`] -- Cancellable delayed round advance
//! - [`scoring`] -- Cumulative distance-error ranking
//! - [`geo`] -- Haversine distance
//! - [`codes`] -- Random session codes and player tokens
//! - [`config`] -- YAML configuration with env overrides
//! - [`error`] -- Typed errors and their client-facing messages

pub mod codes;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod geo;
pub mod registry;
pub mod scheduler;
pub mod scoring;
pub mod session;
pub mod topic;

pub use config::{AppConfig, ConfigError, GameConfig, LogFormat, LoggingConfig, ServerSection};
pub use coordinator::{Connection, Coordinator, parse_message};
pub use error::{CoordinatorError, SessionError};
pub use registry::{SessionEntry, SessionHandle, SessionRegistry};
pub use scheduler::RoundScheduler;
pub use session::{GuessOutcome, RevealEnd, Session};
pub use topic::{Outbox, Topic};
