//! # Vestry Store
//!
//! The local side of Vestry: an embedded, collection-oriented store that the
//! remote-first accessor falls back to when the HTTP API is unreachable.
//!
//! ## Overview
//!
//! [`LocalStore`] keeps the whole live state in memory behind a single lock
//! and writes it through a synchronous [`KeyValueBackend`] before every
//! mutating call returns. Two keys are used: one for the live state and one
//! for the backup history.
//!
//! ## Key Types
//!
//! - [`KeyValueBackend`] - Synchronous get/set persistence
//! - [`SqliteBackend`] - SQLite-based persistent backend
//! - [`MemoryBackend`] - In-memory backend for tests
//! - [`LocalStore`] - CRUD, singleton merge-update, activity log, OTPs, backups
//! - [`StoreConfig`] - Retention limits and OTP lifetime
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vestry_core::{CollectionName, Record};
//! use vestry_store::{LocalStore, SqliteBackend, StoreConfig};
//!
//! fn example() -> vestry_store::Result<()> {
//!     let backend = SqliteBackend::open("vestry.db")?;
//!     let store = LocalStore::open(backend, StoreConfig::default())?;
//!
//!     let news = store.collection(CollectionName::News)?;
//!     println!("{} news items", news.len());
//!
//!     let backup = store.create_backup("before cleanup")?;
//!     store.delete(CollectionName::News, "news-welcome")?;
//!     store.restore(&backup.id)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Staged writes**: every mutation is applied to a clone of the live
//!   state, persisted, then swapped in. A failed write leaves memory untouched.
//! - **Explicit misses**: updating an unknown id is [`StoreError::NotFound`];
//!   deleting one returns `false`.
//! - **Backup before delete**: every `delete` snapshots first, even when the
//!   id turns out not to exist.

pub mod backup;
pub mod config;
pub mod error;
pub mod local;
pub mod memory;
pub mod migration;
pub mod otp;
pub mod sqlite;
pub mod traits;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use local::{LocalStore, StoreBuilder, StoreEvent};
pub use memory::MemoryBackend;
pub use sqlite::SqliteBackend;
pub use traits::{KeyValueBackend, BACKUPS_KEY, LIVE_KEY};
