//! Store configuration.

use std::time::Duration;

/// Retention limits and OTP lifetime.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Backups kept in history; older ones are pruned first.
    pub max_backups: usize,
    /// Activity-log entries kept.
    pub max_log_entries: usize,
    /// How long a one-time passcode stays valid.
    pub otp_ttl: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_backups: 10,
            max_log_entries: 50,
            otp_ttl: Duration::from_secs(10 * 60),
        }
    }
}
