//! Error types for the remote module.

use thiserror::Error;

/// Errors that can occur during a remote-first call.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Connection-level failure (refused, reset, DNS, TLS).
    #[error("network error: {0}")]
    Network(String),

    /// No response within the configured timeout.
    #[error("timeout: {0}")]
    Timeout(String),

    /// Non-2xx response. `message` is the server's `error` field when present.
    #[error("server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// A 2xx response whose body did not decode.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The local fallback itself failed.
    #[error("local fallback failed: {0}")]
    Local(#[from] vestry_store::StoreError),
}

impl RemoteError {
    /// Whether this is a failure to reach the server at all.
    pub fn is_network(&self) -> bool {
        matches!(self, RemoteError::Network(_) | RemoteError::Timeout(_))
    }
}

/// Result type for remote operations.
pub type Result<T> = std::result::Result<T, RemoteError>;
