//! # Vestry Core
//!
//! Pure data model for Vestry: records, collections, singleton documents,
//! the activity log, one-time passcodes and backup snapshots.
//!
//! This crate contains no I/O, no storage, no networking. Everything here is
//! plain data with `serde` support and explicit `Clone`-based deep copies.
//!
//! ## Key Types
//!
//! - [`Record`] - A JSON object; keyed records carry an `id` field
//! - [`CollectionName`] - The fixed set of keyed collections and singletons
//! - [`Collection`] - Ordered records, most recent first
//! - [`StoreState`] - The full live state that snapshots capture
//! - [`BackupEntry`], [`LogEntry`], [`OtpRecord`] - Bounded history entries
//!
//! ## Seed Data
//!
//! [`seed_dataset`] returns the deterministic initial dataset a fresh store
//! starts from and that `reset` returns to.

pub mod clock;
pub mod collection;
pub mod error;
pub mod record;
pub mod seed;
pub mod state;
pub mod types;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use collection::{Collection, CollectionName};
pub use error::{CoreError, ValidationError};
pub use record::{generate_id, Record, EMAIL_FIELD, ID_FIELD, SECRET_FIELD};
pub use seed::seed_dataset;
pub use state::StoreState;
pub use types::{
    human_size, BackupEntry, HealthSnapshot, HealthStatus, LogEntry, OtpOutcome, OtpRecord,
    StorePhase,
};
pub use validation::{normalize_email, validate_email, validate_new_password};
