//! # Vestry Remote
//!
//! Remote-first access: every call goes to the HTTP API exactly once, and if
//! that attempt fails for any reason a caller-supplied local fallback runs
//! instead.
//!
//! ## Overview
//!
//! - [`Transport`] - Sends one request, returns status and body
//! - [`HttpTransport`] - reqwest-based transport with a request timeout
//! - [`RemoteFirstAccessor`] - The dispatcher: one remote attempt, then the fallback
//! - [`Fetched`] / [`Origin`] - A value plus where it came from
//!
//! ## Key Properties
//!
//! - **Single attempt**: no retries, ever
//! - **Exactly one path**: either the remote call's result or the fallback's,
//!   never both, so a mutation is never applied twice
//! - **Bounded**: every attempt is wrapped in an explicit timeout
//! - **Observable degradation**: a fallback result is tagged
//!   [`Origin::Local`], distinct from an outright failure (`Err`)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use vestry_remote::{HttpTransport, Method, RemoteConfig, RemoteFirstAccessor};
//!
//! async fn example() -> vestry_remote::Result<()> {
//!     let config = RemoteConfig::new("https://portal.example.org/api");
//!     let transport = HttpTransport::new(&config)?;
//!     let accessor = RemoteFirstAccessor::new(transport, config.timeout);
//!
//!     let news: serde_json::Value = accessor
//!         .remote(Method::Get, "/news", None)
//!         .await?;
//!     println!("{}", news);
//!     Ok(())
//! }
//! ```

pub mod accessor;
pub mod config;
pub mod error;
pub mod http;
pub mod transport;

pub use accessor::{Fetched, Origin, RemoteFirstAccessor};
pub use config::RemoteConfig;
pub use error::{RemoteError, Result};
pub use http::HttpTransport;
pub use transport::memory::{Scripted, ScriptedTransport};
pub use transport::{Method, RemoteRequest, RemoteResponse, Transport};
