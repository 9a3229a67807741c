//! Key-value persistence: the abstract interface under [`LocalStore`].
//!
//! The store serializes its whole state into a handful of string blobs, so
//! the backend only needs synchronous get/set by key. Implementations include
//! SQLite (primary) and in-memory (for tests).
//!
//! [`LocalStore`]: crate::LocalStore

use crate::error::Result;

/// Key holding the serialized live state.
pub const LIVE_KEY: &str = "vestry.live";

/// Key holding the serialized backup history.
pub const BACKUPS_KEY: &str = "vestry.backups";

/// Synchronous key-value persistence.
///
/// `set` must be durable when it returns `Ok`: the store relies on that to
/// promise that every mutation is persisted before the call returns.
pub trait KeyValueBackend: Send + Sync {
    /// Read a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

impl<B: KeyValueBackend + ?Sized> KeyValueBackend for std::sync::Arc<B> {
    fn get(&self, key: &str) -> Result<Option<String>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        (**self).set(key, value)
    }
}
