//! Access credential lifecycle.
//!
//! The credential moves through `Absent → Valid → Expiring → Absent (on use)`;
//! the client transitions `Absent/Expiring → Valid` via the refresh-token
//! grant. A refresh failure leaves the cache empty and surfaces as
//! `ProjectsError::Auth` to the caller of the triggering operation.

use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

/// Time buffer subtracted from the stated expiry to decide a credential
/// needs proactive refresh.
pub const SAFETY_MARGIN_SECS: i64 = 300;

/// An opaque bearer token with its expiry.
#[derive(Debug, Clone)]
pub struct AccessCredential {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AccessCredential {
    /// Build a credential from a token-endpoint response, applying the
    /// safety margin up front so `is_valid` is a plain comparison.
    pub fn from_grant(token: String, expires_in_secs: i64, now: DateTime<Utc>) -> Self {
        Self {
            token,
            expires_at: now + Duration::seconds(expires_in_secs - SAFETY_MARGIN_SECS),
        }
    }

    /// Whether the credential is still usable at `now`.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// The token endpoint's success envelope: `{access_token, expires_in}`.
#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default = "default_expires_in")]
    pub expires_in: i64,
}

fn default_expires_in() -> i64 {
    3600
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_grant_is_valid() {
        let now = Utc::now();
        let cred = AccessCredential::from_grant("tok".into(), 3600, now);
        assert!(cred.is_valid(now));
        // Margin applied: only 55 minutes of usable life
        assert!(cred.is_valid(now + Duration::minutes(54)));
        assert!(!cred.is_valid(now + Duration::minutes(56)));
    }

    #[test]
    fn short_lived_grant_is_immediately_expiring() {
        let now = Utc::now();
        // expires_in below the margin means no usable life at all
        let cred = AccessCredential::from_grant("tok".into(), 120, now);
        assert!(!cred.is_valid(now));
    }

    #[test]
    fn grant_parses_with_default_expiry() {
        let grant: TokenGrant = serde_json::from_str(r#"{"access_token":"abc"}"#).unwrap();
        assert_eq!(grant.access_token, "abc");
        assert_eq!(grant.expires_in, 3600);
    }
}
