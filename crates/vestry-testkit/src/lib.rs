//! # Vestry Testkit
//!
//! Testing utilities for Vestry.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Fixtures**: a [`Vestry`](vestry::Vestry) over an in-memory backend, a
//!   manual clock and a scripted transport
//! - **Generators**: Proptest strategies for operation sequences and inputs
//!
//! ## Test Fixtures
//!
//! ```rust
//! use vestry_testkit::fixtures::TestFixture;
//!
//! let fixture = TestFixture::new();
//! // Nothing is scripted, so every call degrades to the local store.
//! assert_eq!(fixture.transport.call_count(), 0);
//! ```
//!
//! Queue responses to exercise the remote path:
//!
//! ```rust,ignore
//! fixture.transport.respond(200, serde_json::json!([]));
//! let news = fixture.vestry.news().list().await?;
//! assert!(!news.is_degraded());
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use vestry_testkit::generators::{apply, has_unique_ids, store_ops};
//!
//! proptest! {
//!     #[test]
//!     fn ids_stay_unique(ops in store_ops(20)) {
//!         let fixture = TestFixture::new();
//!         for op in &ops {
//!             apply(fixture.store(), CollectionName::News, op).unwrap();
//!         }
//!         prop_assert!(has_unique_ids(&fixture.store().collection(CollectionName::News).unwrap()));
//!     }
//! }
//! ```

pub mod fixtures;
pub mod generators;

pub use fixtures::{init_tracing, member_profile, record, FixtureVestry, TestFixture};
pub use generators::{apply, has_unique_ids, store_ops, StoreOp};
pub use vestry_remote::ScriptedTransport;
