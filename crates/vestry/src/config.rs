//! Top-level configuration.

use vestry_remote::RemoteConfig;
use vestry_store::StoreConfig;

/// Configuration for a [`Vestry`](crate::Vestry) instance.
#[derive(Debug, Clone, Default)]
pub struct VestryConfig {
    /// Retention limits and OTP lifetime for the local store.
    pub store: StoreConfig,
    /// API base URL and per-request timeout.
    pub remote: RemoteConfig,
}

impl VestryConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            store: StoreConfig::default(),
            remote: RemoteConfig::new(base_url),
        }
    }
}
