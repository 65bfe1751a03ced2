//! Error types for quill-engine

use quill_ai::StreamFailure;
use thiserror::Error;

/// Result type alias using quill-engine Error
pub type Result<T> = std::result::Result<T, Error>;

/// Failures surfaced by the session engine.
///
/// All failures are returned as typed outcomes to the immediate caller;
/// none are retried internally. A failed turn never partially commits
/// the transcript.
#[derive(Error, Debug)]
pub enum Error {
    /// Model has no entry in the pricing table
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The session's last message is an unanswered user turn
    #[error("out-of-order turn: last message is already a user message")]
    OutOfOrderTurn,

    /// User text was empty after trimming
    #[error("empty user input")]
    EmptyTurn,

    /// No persisted session with this id
    #[error("session not found: {0}")]
    NotFound(String),

    /// Persistence failed; in-memory session state remains valid
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Transcript record could not be (de)serialized
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The provider reported a failure for the exchange
    #[error("provider error: {0}")]
    Provider(String),

    /// The stream ended with neither success nor error marker
    #[error("connection interrupted mid-stream")]
    ConnectionInterrupted,

    /// The caller abandoned the turn
    #[error("turn cancelled")]
    Cancelled,
}

impl From<StreamFailure> for Error {
    fn from(failure: StreamFailure) -> Self {
        match failure {
            StreamFailure::Provider(message) => Error::Provider(message),
            StreamFailure::Interrupted => Error::ConnectionInterrupted,
            StreamFailure::Cancelled => Error::Cancelled,
        }
    }
}

impl From<quill_ai::Error> for Error {
    fn from(error: quill_ai::Error) -> Self {
        match error {
            quill_ai::Error::UnknownModel(model) => Error::UnknownModel(model),
            other => Error::Provider(other.to_string()),
        }
    }
}
