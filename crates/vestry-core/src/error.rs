//! Error types for Vestry Core.

use thiserror::Error;

/// Core errors raised while building or decoding data-model values.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("expected a JSON object, got {0}")]
    NotAnObject(String),

    #[error("unknown collection: {0}")]
    UnknownCollection(String),

    #[error("encoding error: {0}")]
    EncodingError(String),

    #[error("decoding error: {0}")]
    DecodingError(String),
}

/// Input validation failures.
///
/// These are raised before any mutation is attempted, so a failed validation
/// never leaves partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("password must not be empty")]
    EmptyPassword,

    #[error("missing required field: {0}")]
    MissingField(String),

    #[error("invalid email address: {0}")]
    InvalidEmail(String),
}

impl From<serde_json::Error> for CoreError {
    fn from(e: serde_json::Error) -> Self {
        if e.is_data() || e.is_syntax() || e.is_eof() {
            CoreError::DecodingError(e.to_string())
        } else {
            CoreError::EncodingError(e.to_string())
        }
    }
}
