// common/src/models/session.rs
use serde::{Deserialize, Serialize};
use chrono::{Duration, Utc};

/// Lifetime of the session cookie and of a freshly minted CSRF token
pub const SESSION_TTL_DAYS: i64 = 30;

/// Payload carried inside the signed `app_session` cookie
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub user_id: String,
    pub csrf_token: String,
    /// Seconds since the epoch, 0 means the payload never expires
    pub expires_at: i64,
}

impl SessionData {
    /// Start a session around a freshly generated CSRF token
    pub fn with_csrf_token(csrf_token: String) -> Self {
        Self {
            user_id: String::new(),
            csrf_token,
            expires_at: (Utc::now() + Duration::days(SESSION_TTL_DAYS)).timestamp(),
        }
    }

    /// Whether the payload has passed its expiry at `now` (seconds since the epoch)
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at != 0 && now > self.expires_at
    }

    pub fn has_csrf_token(&self) -> bool {
        !self.csrf_token.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_expiry_never_expires() {
        let session = SessionData {
            expires_at: 0,
            ..Default::default()
        };
        assert!(!session.is_expired_at(i64::MAX));
    }

    #[test]
    fn test_fresh_session_expires_in_thirty_days() {
        let session = SessionData::with_csrf_token("token".to_string());
        let now = Utc::now().timestamp();
        assert!(session.has_csrf_token());
        assert!(!session.is_expired_at(now));
        assert!(session.is_expired_at(now + SESSION_TTL_DAYS * 86400 + 60));
    }
}
