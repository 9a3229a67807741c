//! One-time passcodes for password recovery.
//!
//! At most one code is pending per (normalized) email. Issuing a new code
//! discards the previous one; a successful verification consumes the code.

use rand::Rng;

use vestry_core::{normalize_email, OtpOutcome, OtpRecord};

use crate::error::Result;
use crate::local::LocalStore;
use crate::traits::KeyValueBackend;

impl<B: KeyValueBackend> LocalStore<B> {
    /// Issue a six-digit code for `email`, replacing any pending one.
    pub fn generate_otp(&self, email: &str) -> Result<OtpRecord> {
        let email = normalize_email(email);
        let now = self.now();
        let record = OtpRecord {
            email: email.clone(),
            code: format!("{:06}", rand::thread_rng().gen_range(0..1_000_000u32)),
            expires_at: now + self.config().otp_ttl.as_millis() as i64,
        };

        let mut inner = self.lock()?;
        self.stage(&mut inner, |state| {
            state
                .otps
                .retain(|otp| otp.email != email && otp.is_live(now));
            state.otps.push(record.clone());
            Ok(())
        })?;

        tracing::debug!(expires_at = record.expires_at, "issued one-time passcode");
        Ok(record)
    }

    /// Check `code` against the pending code for `email`.
    ///
    /// Only persistence failures are errors; a wrong, missing or expired
    /// code is reported through [`OtpOutcome`].
    pub fn verify_otp(&self, email: &str, code: &str) -> Result<OtpOutcome> {
        let email = normalize_email(email);
        let now = self.now();
        let mut inner = self.lock()?;

        let pending = match inner.live.otps.iter().find(|otp| otp.email == email) {
            Some(otp) => otp.clone(),
            None => return Ok(OtpOutcome::NoPendingCode),
        };

        let outcome = if !pending.is_live(now) {
            OtpOutcome::Expired
        } else if pending.code != code.trim() {
            return Ok(OtpOutcome::InvalidCode);
        } else {
            OtpOutcome::Verified
        };

        // Both a consumed and an expired code are dropped.
        self.stage(&mut inner, |state| {
            state.otps.retain(|otp| otp.email != email);
            Ok(())
        })?;

        tracing::debug!(?outcome, "verified one-time passcode");
        Ok(outcome)
    }
}
