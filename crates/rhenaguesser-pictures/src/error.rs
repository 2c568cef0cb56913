//! Error types for picture sources.
//!
//! Uses `thiserror` for typed errors that surface through the session
//! coordinator (game creation) and the single-player HTTP endpoints.

/// Errors that can occur while fetching or locating pictures.
#[derive(Debug, thiserror::Error)]
pub enum PictureError {
    /// Not enough qualifying pictures could be found, or the requested
    /// picture does not exist.
    #[error("picture not found: {0}")]
    NotFound(String),

    /// The provider was unreachable or answered with an error status.
    #[error("picture provider error: {0}")]
    Upstream(String),

    /// The provider answered with a payload we could not interpret.
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),

    /// The picture source is misconfigured.
    #[error("picture source config error: {0}")]
    Config(String),
}
