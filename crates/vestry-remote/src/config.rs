//! Remote access configuration.

use std::time::Duration;

/// Where the HTTP API lives and how long to wait for it.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Base URL every endpoint is joined onto, e.g. `https://host/api`.
    pub base_url: String,
    /// Upper bound on a single request, after which it counts as failed.
    pub timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}
