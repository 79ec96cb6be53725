use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::api::AuthGrant;

/// Store key the session record is persisted under
pub const SESSION_KEY: &str = "userData";

/// An authenticated identity with its bearer token.
///
/// Persisted as `{"email","userId","token","expiresAt"}` with `expiresAt`
/// in RFC 3339.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub email: String,
    pub user_id: String,
    token: String,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(
        email: impl Into<String>,
        user_id: impl Into<String>,
        token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            email: email.into(),
            user_id: user_id.into(),
            token: token.into(),
            expires_at,
        }
    }

    /// Build a session from a fresh grant; the validity window starts at `now`.
    ///
    /// `None` when the window does not fit in a timestamp.
    pub fn from_grant(grant: AuthGrant, now: DateTime<Utc>) -> Option<Self> {
        let expires_at = Duration::try_seconds(grant.expires_in_secs)
            .and_then(|window| now.checked_add_signed(window))?;
        Some(Self {
            email: grant.email,
            user_id: grant.user_id,
            token: grant.token,
            expires_at,
        })
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// The bearer token, or `None` once the session has expired
    pub fn token_at(&self, now: DateTime<Utc>) -> Option<&str> {
        if self.is_expired_at(now) {
            None
        } else {
            Some(&self.token)
        }
    }

    /// Negative once expired
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> Duration {
        self.expires_at - now
    }

    pub(crate) fn to_record(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub(crate) fn from_record(record: &str) -> serde_json::Result<Self> {
        serde_json::from_str(record)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn grant(expires_in_secs: i64) -> AuthGrant {
        AuthGrant {
            email: "a@b.c".to_string(),
            user_id: "uid".to_string(),
            token: "tok".to_string(),
            expires_in_secs,
        }
    }

    #[test]
    fn test_from_grant_sets_expiry() {
        let now = at("2024-03-01T12:00:00Z");
        let session = Session::from_grant(grant(3600), now).unwrap();
        assert_eq!(session.expires_at, at("2024-03-01T13:00:00Z"));
        assert_eq!(session.email, "a@b.c");
        assert_eq!(session.user_id, "uid");
    }

    #[test]
    fn test_token_hidden_once_expired() {
        let session = Session::new("a@b.c", "uid", "tok", at("2024-03-01T13:00:00Z"));

        assert_eq!(session.token_at(at("2024-03-01T12:59:59Z")), Some("tok"));
        assert_eq!(session.token_at(at("2024-03-01T13:00:00Z")), None);
        assert_eq!(session.token_at(at("2024-03-02T00:00:00Z")), None);
    }

    #[test]
    fn test_from_grant_rejects_unrepresentable_window() {
        let now = at("2024-03-01T12:00:00Z");
        // Fits in a TimeDelta but not in a DateTime
        assert_eq!(Session::from_grant(grant(99_999_999_999_999), now), None);
        // Does not fit in a TimeDelta
        assert_eq!(Session::from_grant(grant(i64::MAX), now), None);
    }

    #[test]
    fn test_time_until_expiry_negative_once_expired() {
        let session = Session::new("a@b.c", "uid", "tok", at("2024-03-01T13:00:00Z"));
        assert_eq!(session.time_until_expiry(at("2024-03-01T12:30:00Z")), Duration::minutes(30));
        assert!(session.time_until_expiry(at("2024-03-01T14:00:00Z")) < Duration::zero());
    }

    #[test]
    fn test_record_format() {
        let session = Session::new("a@b.c", "uid", "tok", at("2024-03-01T13:00:00Z"));
        let value: serde_json::Value = serde_json::from_str(&session.to_record().unwrap()).unwrap();
        assert_eq!(value["email"], "a@b.c");
        assert_eq!(value["userId"], "uid");
        assert_eq!(value["token"], "tok");
        assert_eq!(value["expiresAt"], "2024-03-01T13:00:00Z");

        let restored = Session::from_record(
            r#"{"email":"a@b.c","userId":"uid","token":"tok","expiresAt":"2024-03-01T13:00:00.000Z"}"#,
        )
        .unwrap();
        assert_eq!(restored, session);
    }
}
