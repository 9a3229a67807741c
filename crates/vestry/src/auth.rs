//! Sign-in, registration and OTP-based password recovery.
//!
//! Input is validated before anything is sent or written. Records returned
//! from these calls never carry the password field.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use vestry_core::{
    normalize_email, validate_email, validate_new_password, CollectionName, OtpOutcome, Record,
    ValidationError, EMAIL_FIELD, SECRET_FIELD,
};
use vestry_remote::{Fetched, Method, Transport};
use vestry_store::{KeyValueBackend, StoreError};

use crate::error::{Result, VestryError};
use crate::facade::Vestry;
use crate::resource::keyed_reply;

/// What was sent when a reset code was requested.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpDispatch {
    #[serde(default)]
    pub email: String,
    /// The code itself. Only the local fallback, which has no mail delivery,
    /// hands it back.
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Shapes accepted from `POST /auth/otp/verify`.
///
/// Only an explicit outcome or a true flag verifies; anything else is
/// treated as a wrong code.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VerifyReply {
    Outcome(OtpOutcome),
    Flag {
        #[serde(alias = "verified")]
        valid: bool,
    },
    Success {
        success: bool,
    },
    Other(IgnoredAny),
}

impl VerifyReply {
    fn outcome(self) -> OtpOutcome {
        match self {
            VerifyReply::Outcome(outcome) => outcome,
            VerifyReply::Flag { valid: true } | VerifyReply::Success { success: true } => {
                OtpOutcome::Verified
            }
            VerifyReply::Flag { valid: false }
            | VerifyReply::Success { success: false }
            | VerifyReply::Other(_) => OtpOutcome::InvalidCode,
        }
    }
}

fn require(value: &str, field: &str) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field.to_string()));
    }
    Ok(())
}

impl<B: KeyValueBackend, T: Transport> Vestry<B, T> {
    /// Sign in. Email matching ignores case; the password must match exactly.
    pub async fn login(&self, email: &str, password: &str) -> Result<Fetched<Record>> {
        validate_email(email)?;
        require(password, SECRET_FIELD)?;

        let store = self.store();
        let body = json!({ "email": email.trim(), "password": password });
        let fetched: Fetched<Option<Record>> = self
            .remote()
            .with_fallback(Method::Post, "/auth/login", Some(body), || {
                store.verify_credential(email, password)
            })
            .await?;

        match fetched.value {
            Some(member) => Ok(Fetched {
                value: member.without(SECRET_FIELD),
                origin: fetched.origin,
            }),
            None => {
                tracing::debug!("sign-in rejected");
                Err(VestryError::InvalidCredentials)
            }
        }
    }

    /// Register a member. `profile` must carry an email; the password is
    /// checked against its confirmation first.
    pub async fn register(
        &self,
        profile: Record,
        password: &str,
        confirm: &str,
    ) -> Result<Fetched<Record>> {
        validate_new_password(password, confirm)?;
        let email = profile
            .get_str(EMAIL_FIELD)
            .map(str::to_string)
            .ok_or_else(|| ValidationError::MissingField(EMAIL_FIELD.to_string()))?;
        validate_email(&email)?;

        let mut member = profile;
        member.insert(EMAIL_FIELD, email.trim());
        member.insert(SECRET_FIELD, password);

        let store = self.store();
        let sent = member.clone();
        let body = Value::from(member.clone());
        let fetched: Fetched<Value> = self
            .remote()
            .with_fallback(Method::Post, "/auth/register", Some(body), || {
                let taken = store
                    .collection(CollectionName::Members)?
                    .iter()
                    .any(|m| m.email_matches(&email));
                if taken {
                    return Err(StoreError::InvalidOperation(format!(
                        "email already registered: {}",
                        normalize_email(&email)
                    )));
                }
                store.insert(CollectionName::Members, member).map(Value::from)
            })
            .await?;

        Ok(fetched.map(|reply| keyed_reply(reply, sent).without(SECRET_FIELD)))
    }

    /// Request a password-reset code for `email`.
    pub async fn request_password_reset(&self, email: &str) -> Result<Fetched<OtpDispatch>> {
        validate_email(email)?;

        let store = self.store();
        let body = json!({ "email": email.trim() });
        let fetched: Fetched<Value> = self
            .remote()
            .with_fallback(Method::Post, "/auth/otp", Some(body), || {
                let otp = store.generate_otp(email)?;
                let dispatch = OtpDispatch {
                    email: otp.email,
                    code: Some(otp.code),
                    expires_at: Some(otp.expires_at),
                    message: None,
                };
                Ok(serde_json::to_value(dispatch)?)
            })
            .await?;

        Ok(fetched.map(|reply| {
            let mut dispatch: OtpDispatch = serde_json::from_value(reply).unwrap_or_default();
            if dispatch.email.is_empty() {
                dispatch.email = normalize_email(email);
            }
            dispatch
        }))
    }

    /// Check a reset code. A wrong or expired code is an outcome, not an error.
    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<Fetched<OtpOutcome>> {
        validate_email(email)?;
        require(code, "code")?;

        let store = self.store();
        let body = json!({ "email": email.trim(), "code": code.trim() });
        let fetched = self
            .remote()
            .with_fallback(Method::Post, "/auth/otp/verify", Some(body), || {
                store.verify_otp(email, code).map(VerifyReply::Outcome)
            })
            .await?;

        Ok(fetched.map(VerifyReply::outcome))
    }

    /// Set a new password for the member with this email.
    pub async fn reset_password(
        &self,
        email: &str,
        password: &str,
        confirm: &str,
    ) -> Result<Fetched<()>> {
        validate_email(email)?;
        validate_new_password(password, confirm)?;

        let store = self.store();
        let body = json!({ "email": email.trim(), "password": password });
        let mut patch = Record::new();
        patch.insert(SECRET_FIELD, password);

        let fetched: Fetched<Value> = self
            .remote()
            .with_fallback(Method::Post, "/auth/password", Some(body), || {
                store
                    .update_by_email(CollectionName::Members, email, patch)
                    .map(|_| Value::Null)
            })
            .await?;

        Ok(fetched.map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(raw: &str) -> OtpOutcome {
        serde_json::from_str::<VerifyReply>(raw).unwrap().outcome()
    }

    #[test]
    fn test_verify_reply_shapes() {
        assert_eq!(reply(r#""expired""#), OtpOutcome::Expired);
        assert_eq!(reply(r#"{"valid": false}"#), OtpOutcome::InvalidCode);
        assert_eq!(reply(r#"{"verified": true}"#), OtpOutcome::Verified);
        assert_eq!(reply(r#"{"success": true}"#), OtpOutcome::Verified);
        assert_eq!(
            reply(r#"{"success": false, "message": "Invalid code"}"#),
            OtpOutcome::InvalidCode
        );
        assert_eq!(reply(r#"{"message": "ok"}"#), OtpOutcome::InvalidCode);
        assert_eq!(reply(r#"{"error": "Code expired"}"#), OtpOutcome::InvalidCode);
        assert_eq!(reply("null"), OtpOutcome::InvalidCode);
        assert_eq!(reply(r#""ok""#), OtpOutcome::InvalidCode);
    }

    #[test]
    fn test_dispatch_defaults() {
        let dispatch: OtpDispatch = serde_json::from_str(r#"{"message": "sent"}"#).unwrap();
        assert!(dispatch.email.is_empty());
        assert_eq!(dispatch.code, None);
        assert_eq!(dispatch.message.as_deref(), Some("sent"));
    }
}
