//! WebSocket wire protocol.
//!
//! Every frame is one JSON object discriminated by its `action` field.
//! [`ClientMessage`] is the closed set of inbound actions and
//! [`ServerEvent`] the closed set of outbound events. Anything that does
//! not parse into a known variant is rejected at the boundary, so the
//! coordinator only ever sees typed, validated values.
//!
//! Field-level checks that serde cannot express (non-blank nicknames,
//! length limits) are declared with `validator` on the request structs and
//! run once through [`Validate`] on [`ClientMessage`].

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::ids::{PictureId, PlayerId, SessionId};
use crate::structs::{Coordinate, Guess, Player, ScoreEntry};

/// Longest accepted nickname, in characters.
pub const MAX_USERNAME_LEN: u64 = 32;

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// An action sent by a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ClientMessage {
    /// Open a new session with the sender as first player.
    Create(CreateRequest),
    /// Enter an existing session that has not started.
    Join(JoinRequest),
    /// Begin the first round of a waiting session.
    Start(StartRequest),
    /// Submit a coordinate for the current round.
    Guess(GuessRequest),
    /// Ask for the current scoreboard.
    GetScores(GetScoresRequest),
    /// Liveness probe.
    Ping,
}

impl ClientMessage {
    /// Every `action` value the server understands.
    pub const ACTIONS: [&'static str; 6] = ["create", "join", "start", "guess", "getScores", "ping"];

    /// The wire name of this action.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::Create(_) => "create",
            Self::Join(_) => "join",
            Self::Start(_) => "start",
            Self::Guess(_) => "guess",
            Self::GetScores(_) => "getScores",
            Self::Ping => "ping",
        }
    }

    /// Whether `action` names a known inbound action.
    pub fn is_known_action(action: &str) -> bool {
        Self::ACTIONS.contains(&action)
    }
}

impl Validate for ClientMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        match self {
            Self::Create(request) => request.validate(),
            Self::Join(request) => request.validate(),
            Self::Start(_) | Self::Guess(_) | Self::GetScores(_) | Self::Ping => Ok(()),
        }
    }
}

/// Payload of `create`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Validate)]
#[ts(export, export_to = "bindings/")]
pub struct CreateRequest {
    /// Nickname of the creating player.
    #[validate(length(min = 1, max = MAX_USERNAME_LEN), custom(function = "non_blank"))]
    pub username: String,
}

/// Payload of `join`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, Validate)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct JoinRequest {
    /// Code of the session to join.
    pub game_id: SessionId,
    /// Nickname of the joining player.
    #[validate(length(min = 1, max = MAX_USERNAME_LEN), custom(function = "non_blank"))]
    pub username: String,
}

/// Payload of `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct StartRequest {
    /// Code of the session to start.
    pub game_id: SessionId,
}

/// Payload of `guess`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GuessRequest {
    /// Code of the session.
    pub game_id: SessionId,
    /// Player submitting the guess.
    pub player_id: PlayerId,
    /// The guessed coordinate.
    pub guess: Coordinate,
    /// Round the client believes it is answering. When present and stale,
    /// the guess is refused instead of landing in another round.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub round: Option<usize>,
}

/// Payload of `getScores`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "camelCase")]
pub struct GetScoresRequest {
    /// Code of the session.
    pub game_id: SessionId,
}

fn non_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("blank"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// An event pushed by the server, either directly to one connection or
/// broadcast to every subscriber of a session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ServerEvent {
    /// Reply to `create`.
    GameCreated {
        /// Code of the new session.
        #[serde(rename = "gameId")]
        game_id: SessionId,
        /// Token of the creating player.
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        /// Roster (just the creator).
        players: Vec<Player>,
    },
    /// Reply to `join`.
    Joined {
        /// Code of the joined session.
        #[serde(rename = "gameId")]
        game_id: SessionId,
        /// Token of the joining player.
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        /// Full roster including the new player.
        players: Vec<Player>,
    },
    /// The roster changed, or a subscriber left.
    PlayerListUpdated {
        /// Current roster in join order.
        players: Vec<Player>,
    },
    /// The session moved to `active`.
    GameStarted {
        /// Picture of the first round.
        #[serde(rename = "locationId")]
        location_id: PictureId,
    },
    /// A player submitted a guess for the current round.
    NewGuess {
        /// Who guessed.
        #[serde(rename = "playerId")]
        player_id: PlayerId,
        /// The guess itself.
        guess: Guess,
    },
    /// Every player has answered; reveal the round.
    RoundComplete {
        /// All guesses of the round, in submission order.
        guesses: Vec<Guess>,
        /// Where the picture was actually taken.
        #[serde(rename = "realPosition")]
        real_position: Coordinate,
    },
    /// The next round is open. `None` means all rounds are played.
    NextLocation {
        /// Picture of the next round.
        #[serde(rename = "locationId")]
        location_id: Option<PictureId>,
    },
    /// Reply to `getScores`.
    Scores {
        /// Ranked scoreboard.
        scores: Vec<ScoreEntry>,
    },
    /// Reply to `ping`.
    Pong,
    /// The request could not be honoured.
    Error {
        /// Short human-readable reason.
        message: String,
    },
}

impl ServerEvent {
    /// Build an [`ServerEvent::Error`] from any message.
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    /// The wire name of this event.
    pub const fn action(&self) -> &'static str {
        match self {
            Self::GameCreated { .. } => "gameCreated",
            Self::Joined { .. } => "joined",
            Self::PlayerListUpdated { .. } => "playerListUpdated",
            Self::GameStarted { .. } => "gameStarted",
            Self::NewGuess { .. } => "newGuess",
            Self::RoundComplete { .. } => "roundComplete",
            Self::NextLocation { .. } => "nextLocation",
            Self::Scores { .. } => "scores",
            Self::Pong => "pong",
            Self::Error { .. } => "error",
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_guess_with_short_coordinate_names() {
        let raw = r#"{"action":"guess","gameId":"K7QZ","playerId":"ab12cd34","guess":{"lat":48.5,"lng":7.7}}"#;
        let message: ClientMessage = serde_json::from_str(raw).unwrap();
        match message {
            ClientMessage::Guess(request) => {
                assert_eq!(request.game_id, SessionId::from("K7QZ"));
                assert_eq!(request.guess, Coordinate::new(48.5, 7.7));
                assert_eq!(request.round, None);
            }
            other => panic!("expected guess, got {other:?}"),
        }
    }

    #[test]
    fn ping_ignores_extra_fields() {
        let message: ClientMessage = serde_json::from_str(r#"{"action":"ping","ts":1}"#).unwrap();
        assert_eq!(message, ClientMessage::Ping);
    }

    #[test]
    fn unknown_action_does_not_parse() {
        let parsed: Result<ClientMessage, _> = serde_json::from_str(r#"{"action":"dance"}"#);
        assert!(parsed.is_err());
        assert!(!ClientMessage::is_known_action("dance"));
        assert!(ClientMessage::is_known_action("getScores"));
    }

    #[test]
    fn missing_field_does_not_parse() {
        let parsed: Result<ClientMessage, _> = serde_json::from_str(r#"{"action":"join","username":"A"}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn blank_or_long_usernames_fail_validation() {
        let blank = ClientMessage::Create(CreateRequest {
            username: String::from("   "),
        });
        assert!(blank.validate().is_err());

        let long = ClientMessage::Join(JoinRequest {
            game_id: SessionId::from("K7QZ"),
            username: "x".repeat(33),
        });
        assert!(long.validate().is_err());

        let fine = ClientMessage::Create(CreateRequest {
            username: String::from("Rhena"),
        });
        assert!(fine.validate().is_ok());
    }

    #[test]
    fn events_serialize_with_action_tag_and_camel_case_fields() {
        let event = ServerEvent::GameCreated {
            game_id: SessionId::from("K7QZ"),
            player_id: PlayerId::from("ab12cd34"),
            players: vec![Player {
                id: PlayerId::from("ab12cd34"),
                username: String::from("Rhena"),
            }],
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["action"], "gameCreated");
        assert_eq!(json["gameId"], "K7QZ");
        assert_eq!(json["playerId"], "ab12cd34");
        assert_eq!(json["players"][0]["username"], "Rhena");
        assert_eq!(event.action(), "gameCreated");
    }

    #[test]
    fn exhausted_rounds_serialize_null_location() {
        let json = serde_json::to_value(ServerEvent::NextLocation { location_id: None }).unwrap();
        assert_eq!(json["action"], "nextLocation");
        assert!(json["locationId"].is_null());

        let pong = serde_json::to_value(ServerEvent::Pong).unwrap();
        assert_eq!(pong, serde_json::json!({"action": "pong"}));
    }
}
