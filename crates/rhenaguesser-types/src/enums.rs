//! Enumeration types for game sessions.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Lifecycle status of a game session.
///
/// Transitions are one-directional: `Waiting -> Active -> Finished`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Lobby: players may join, no round is playable yet.
    Waiting,
    /// Rounds are in progress.
    Active,
    /// All rounds are complete; only the scoreboard remains.
    Finished,
}

/// Sub-state of an active round.
///
/// After a round completes the session stays in `Revealing` until the
/// next location is published, so late guesses cannot leak into the
/// following round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum RoundPhase {
    /// Guesses for the current round are accepted.
    Guessing,
    /// The previous round is being revealed; guesses are refused.
    Revealing,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&SessionStatus::Waiting).ok();
        assert_eq!(json.as_deref(), Some("\"waiting\""));
    }
}
