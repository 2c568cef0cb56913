//! Error types for the session coordinator.
//!
//! [`SessionError`] covers rule violations detected by the [`Session`]
//! state machine itself. [`CoordinatorError`] wraps those together with
//! lookup, validation and creation failures, and knows how to phrase each
//! one for the client that caused it.
//!
//! [`Session`]: crate::session::Session

use rhenaguesser_pictures::PictureError;
use rhenaguesser_types::{PlayerId, SessionId, SessionStatus};

/// A request that the session's current state does not allow.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session is not in the status the action requires.
    #[error("game is {actual:?}, expected {expected:?}")]
    WrongStatus {
        /// Status the action requires.
        expected: SessionStatus,
        /// Status the session is in.
        actual: SessionStatus,
    },

    /// The current round is being revealed and takes no more guesses.
    #[error("Round is not accepting guesses")]
    RoundClosed,

    /// The guess names a round other than the open one.
    #[error("guess for round {requested} but round {current} is open")]
    RoundMismatch {
        /// Round currently open.
        current: usize,
        /// Round named by the client.
        requested: usize,
    },

    /// The player id does not belong to this session.
    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),

    /// A session cannot be created without pictures.
    #[error("a game needs at least one picture")]
    NoPictures,
}

/// Errors surfaced by [`Coordinator`](crate::coordinator::Coordinator)
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    /// No live session has this id.
    #[error("game {0} not found")]
    SessionNotFound(SessionId),

    /// The session refused the action.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The frame has no `action`, or one the server does not know.
    #[error("unknown or missing action")]
    UnknownAction,

    /// The frame is not JSON, or its fields do not fit the action.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Pictures for a new session could not be fetched.
    #[error("failed to create game: {0}")]
    CreateFailed(#[from] PictureError),

    /// Every generated id collided with an existing one.
    #[error("could not allocate a unique id after {0} attempts")]
    IdSpaceExhausted(usize),
}

impl CoordinatorError {
    /// Short message sent back in an `error` event.
    pub fn client_message(&self) -> String {
        match self {
            Self::SessionNotFound(_) => "Game not found".to_owned(),
            Self::Session(SessionError::WrongStatus {
                expected: SessionStatus::Waiting,
                ..
            }) => "Game already started".to_owned(),
            Self::Session(SessionError::WrongStatus {
                expected: SessionStatus::Active,
                actual: SessionStatus::Waiting,
            }) => "Game not started".to_owned(),
            Self::Session(SessionError::WrongStatus { .. }) => "Game is over".to_owned(),
            Self::Session(e) => e.to_string(),
            Self::UnknownAction => "Invalid action".to_owned(),
            Self::Validation(msg) => format!("Invalid message format: {msg}"),
            Self::CreateFailed(_) | Self::IdSpaceExhausted(_) => "Failed to create game".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creation_failures_share_one_client_message() {
        let upstream = CoordinatorError::CreateFailed(PictureError::Upstream("timeout".to_owned()));
        assert_eq!(upstream.client_message(), "Failed to create game");
        assert_eq!(
            CoordinatorError::IdSpaceExhausted(64).client_message(),
            "Failed to create game"
        );
    }

    #[test]
    fn wrong_status_is_phrased_per_situation() {
        let join_active = CoordinatorError::from(SessionError::WrongStatus {
            expected: SessionStatus::Waiting,
            actual: SessionStatus::Active,
        });
        assert_eq!(join_active.client_message(), "Game already started");

        let guess_waiting = CoordinatorError::from(SessionError::WrongStatus {
            expected: SessionStatus::Active,
            actual: SessionStatus::Waiting,
        });
        assert_eq!(guess_waiting.client_message(), "Game not started");

        let guess_finished = CoordinatorError::from(SessionError::WrongStatus {
            expected: SessionStatus::Active,
            actual: SessionStatus::Finished,
        });
        assert_eq!(guess_finished.client_message(), "Game is over");
    }

    #[test]
    fn malformed_frames_are_phrased_for_the_client() {
        assert_eq!(CoordinatorError::UnknownAction.client_message(), "Invalid action");
        let invalid = CoordinatorError::Validation("missing field `gameId`".to_owned());
        assert_eq!(
            invalid.client_message(),
            "Invalid message format: missing field `gameId`"
        );
    }

    #[test]
    fn round_closed_keeps_its_message() {
        let closed = CoordinatorError::from(SessionError::RoundClosed);
        assert_eq!(closed.client_message(), "Round is not accepting guesses");
    }
}
