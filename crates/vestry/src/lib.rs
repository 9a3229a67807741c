//! # Vestry
//!
//! The unified API for the Vestry portal's data layer: every read and write
//! goes to the remote HTTP API first and falls back to an embedded local
//! store when the API cannot be reached.
//!
//! ## Overview
//!
//! - **Resources**: keyed collections (`members`, `news`, `leaders`,
//!   `announcements`, `departments`, `donations`, `contacts`) with list, get,
//!   create, update and delete
//! - **Documents**: the `home` and `about` configuration singletons, updated
//!   by merge
//! - **Auth**: sign-in, registration and OTP-based password reset
//! - **System**: health, activity log, backups, restore and reset
//!
//! Every call returns a [`Fetched`] value whose [`Origin`] tells a degraded
//! (local-only) answer apart from a remote one. An `Err` means the operation
//! failed outright.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vestry::{Vestry, VestryConfig};
//! use vestry::core::Record;
//! use vestry::store::SqliteBackend;
//!
//! async fn example() -> vestry::Result<()> {
//!     let backend = SqliteBackend::open("vestry.db")?;
//!     let vestry = Vestry::connect(backend, VestryConfig::new("https://portal.example/api"))?;
//!
//!     let news = vestry.news().list().await?;
//!     if news.is_degraded() {
//!         println!("offline: showing {} local items", news.value.len());
//!     }
//!
//!     let mut item = Record::new();
//!     item.insert("title", "Harvest festival");
//!     vestry.news().create(item).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Re-exports
//!
//! This crate re-exports the component crates for convenience:
//!
//! - `vestry::core` - Records, collections, seed dataset, clock
//! - `vestry::store` - Key-value backends and the local store
//! - `vestry::remote` - Transports and the remote-first accessor

pub mod auth;
pub mod config;
pub mod error;
pub mod facade;
pub mod resource;
pub mod system;

// Re-export component crates
pub use vestry_core as core;
pub use vestry_remote as remote;
pub use vestry_store as store;

// Re-export main types for convenience
pub use auth::OtpDispatch;
pub use config::VestryConfig;
pub use error::{Result, VestryError};
pub use facade::Vestry;
pub use resource::{Document, Donations, Members, Resource};

// Re-export commonly used component types
pub use vestry_core::{
    BackupEntry, CollectionName, HealthSnapshot, LogEntry, OtpOutcome, Record,
};
pub use vestry_remote::{Fetched, Origin};
pub use vestry_store::{LocalStore, StoreEvent};
