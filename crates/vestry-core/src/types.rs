//! Bounded history entries and status types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::collection::CollectionName;
use crate::state::StoreState;

/// One activity-log line. The log is a ring buffer, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub id: String,
    pub action: String,
    /// Unix ms.
    pub timestamp: i64,
}

/// A pending one-time passcode for password recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpRecord {
    /// Normalized (lowercase) email.
    pub email: String,
    /// Six ASCII digits.
    pub code: String,
    /// Unix ms after which the code is no longer accepted.
    pub expires_at: i64,
}

impl OtpRecord {
    /// A code is live strictly before its expiry instant.
    pub fn is_live(&self, now: i64) -> bool {
        now < self.expires_at
    }
}

/// Outcome of an OTP verification.
///
/// Failures are ordinary values so callers can render a message instead of
/// handling an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OtpOutcome {
    /// Code matched and was consumed.
    Verified,
    /// No code is pending for this email.
    NoPendingCode,
    /// A code is pending but this is not it.
    InvalidCode,
    /// The pending code has expired (and was discarded).
    Expired,
}

impl OtpOutcome {
    pub fn is_verified(self) -> bool {
        matches!(self, OtpOutcome::Verified)
    }

    /// Short user-facing message.
    pub fn message(self) -> &'static str {
        match self {
            OtpOutcome::Verified => "Code verified",
            OtpOutcome::NoPendingCode => "No verification code was requested for this email",
            OtpOutcome::InvalidCode => "Invalid verification code",
            OtpOutcome::Expired => "Verification code has expired",
        }
    }
}

/// A point-in-time snapshot of the full live state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupEntry {
    pub id: String,
    /// Unix ms.
    pub timestamp: i64,
    /// Human-readable serialized size, e.g. `"3.42 KB"`.
    pub size: String,
    pub description: String,
    /// Hex BLAKE3 digest of the serialized snapshot.
    #[serde(default)]
    pub checksum: String,
    /// Remote listings omit the snapshot body.
    #[serde(default)]
    pub snapshot: StoreState,
}

/// Lifecycle phase of a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorePhase {
    /// Freshly seeded, no mutation applied yet.
    Seeded,
    /// At least one mutation has been applied, or state was loaded from storage.
    Active,
}

/// Overall health indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

/// Store health report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    pub status: HealthStatus,
    pub phase: StorePhase,
    /// Estimated serialized size of the live state in bytes.
    pub size_bytes: usize,
    /// Human-readable form of `size_bytes`.
    pub size: String,
    pub counts: BTreeMap<CollectionName, usize>,
    pub backups: usize,
    pub log_entries: usize,
    pub pending_otps: usize,
    /// Unix ms.
    pub timestamp: i64,
}

/// Format a byte count, e.g. `512 B`, `3.42 KB`, `1.10 MB`.
pub fn human_size(bytes: usize) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;

    let b = bytes as f64;
    if b < KB {
        format!("{} B", bytes)
    } else if b < MB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{:.2} MB", b / MB)
    }
}
