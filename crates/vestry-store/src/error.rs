//! Error types for the store module.

use thiserror::Error;
use vestry_core::{CollectionName, CoreError};

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// State serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// No record with this id (or email) in the collection.
    #[error("{key} not found in {collection}")]
    NotFound {
        collection: CollectionName,
        key: String,
    },

    /// A record with this id already exists.
    #[error("duplicate id {id} in {collection}")]
    DuplicateId {
        collection: CollectionName,
        id: String,
    },

    /// Operation not valid for this collection (e.g. deleting a singleton).
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// Backup id not in history.
    #[error("backup not found: {0}")]
    BackupNotFound(String),

    /// Backup snapshot does not match its recorded checksum.
    #[error("backup {0} failed checksum verification")]
    CorruptBackup(String),

    /// Invalid data in storage.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Backend refused the write.
    #[error("write failed for key {key}: {reason}")]
    WriteFailed { key: String, reason: String },

    /// A lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

impl From<CoreError> for StoreError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::EncodingError(msg) | CoreError::DecodingError(msg) => {
                StoreError::Serialization(msg)
            }
            other => StoreError::InvalidData(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
