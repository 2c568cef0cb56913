//! Core entity structs shared by the game server and its clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::enums::SessionStatus;
use crate::ids::{PictureId, PlayerId, SessionId};

// ---------------------------------------------------------------------------
// Geography
// ---------------------------------------------------------------------------

/// A latitude/longitude pair in degrees.
///
/// Ranges are not validated. Input accepts the short `lat`/`lng`
/// spellings as well as the canonical long names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Coordinate {
    /// Latitude in degrees (north positive).
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in degrees (east positive).
    #[serde(alias = "lng")]
    pub longitude: f64,
}

impl Coordinate {
    /// Build a coordinate from latitude and longitude in degrees.
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// A geo-located picture from the photo provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Picture {
    /// Provider-side picture identifier.
    pub id: PictureId,
    /// Where the picture was taken.
    pub position: Coordinate,
}

// ---------------------------------------------------------------------------
// Players and guesses
// ---------------------------------------------------------------------------

/// A participant in a session.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Player {
    /// Token identifying the player inside its session.
    pub id: PlayerId,
    /// Nickname chosen on create/join.
    pub username: String,
}

/// One player's answer for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Guess {
    /// The player who guessed.
    #[serde(rename = "playerId")]
    pub player_id: PlayerId,
    /// The guessed coordinate.
    pub position: Coordinate,
}

// ---------------------------------------------------------------------------
// Scoring and listing
// ---------------------------------------------------------------------------

/// One row of a scoreboard.
///
/// `score` is the cumulative distance error in meters; lower is better.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ScoreEntry {
    /// 1-based position in the ranking.
    pub rank: usize,
    /// Display name of the player.
    pub player: String,
    /// Sum of per-round distance errors, in meters.
    pub score: f64,
}

/// Lightweight projection of a live session for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    /// Session code.
    pub id: SessionId,
    /// Lifecycle status.
    pub status: SessionStatus,
    /// Number of players in the roster.
    pub players: usize,
    /// Zero-based index of the current round.
    pub current_round: usize,
    /// Total number of rounds in the session.
    pub rounds: usize,
}
