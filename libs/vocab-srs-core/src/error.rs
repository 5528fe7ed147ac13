//! Error types for vocab-srs-core.

use thiserror::Error;

/// Result type alias using SrsError.
pub type Result<T> = std::result::Result<T, SrsError>;

/// Errors raised by the scheduler, selector and session.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SrsError {
    #[error("invalid review quality {value}: expected 0-5")]
    InvalidQuality { value: i64 },

    #[error("invalid review record for word {word_id}: {reason}")]
    InvalidRecord { word_id: String, reason: String },

    #[error("no card to review: session is empty or complete")]
    EmptySession,

    #[error("failed to persist review for word {word_id}: {message}")]
    PersistenceFailure { word_id: String, message: String },
}

impl SrsError {
    pub(crate) fn invalid_record(word_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidRecord {
            word_id: word_id.to_string(),
            reason: reason.into(),
        }
    }
}
