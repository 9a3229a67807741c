//! Error types for the Vestry facade.

use thiserror::Error;
use vestry_core::{CollectionName, ValidationError};
use vestry_remote::RemoteError;
use vestry_store::StoreError;

/// Errors that can occur during Vestry operations.
#[derive(Debug, Error)]
pub enum VestryError {
    /// Input rejected before any remote call or local mutation.
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Local store error, outside of a remote-first call.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Remote call failed and no fallback applied, or the fallback failed.
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),

    /// Email and password did not match a member.
    #[error("invalid email or password")]
    InvalidCredentials,

    /// The operation does not apply to this collection.
    #[error("{op} is not supported for {collection}")]
    Unsupported {
        collection: CollectionName,
        op: &'static str,
    },
}

impl VestryError {
    /// The underlying store error, whether raised directly or by a fallback.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            VestryError::Store(e) | VestryError::Remote(RemoteError::Local(e)) => Some(e),
            _ => None,
        }
    }
}

/// Result type for Vestry operations.
pub type Result<T> = std::result::Result<T, VestryError>;
