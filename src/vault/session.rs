use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Lifetime assumed for a vault token; the logon API does not report one
pub const SESSION_LIFETIME_MINUTES: i64 = 20;

/// What a successful login produces
pub type SessionSeed = Session;

/// An authenticated vault session. The token is already sanitized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub base_url: String,
    pub username: String,
}

impl Session {
    pub fn new(token: String, base_url: String, username: String, created_at: DateTime<Utc>) -> Self {
        Self {
            token,
            created_at,
            expires_at: created_at + Duration::minutes(SESSION_LIFETIME_MINUTES),
            base_url,
            username,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Time left before expiry, zero once expired
    pub fn remaining_at(&self, now: DateTime<Utc>) -> Duration {
        (self.expires_at - now).max(Duration::zero())
    }
}

/// Single-slot holder for the current session.
///
/// One holder serves one logical user. Expiry is not enforced here; callers
/// check [`Session::is_expired`] before proxying.
#[derive(Debug, Default)]
pub struct SessionHolder {
    current: Option<Session>,
}

impl SessionHolder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace whatever was held before
    pub fn set(&mut self, session: Session) {
        tracing::debug!("Session set for user {}", session.username);
        self.current = Some(session);
    }

    /// Drop the session; a no-op on an empty holder
    pub fn clear(&mut self) {
        if self.current.take().is_some() {
            tracing::debug!("Session cleared");
        }
    }

    pub fn current(&self) -> Option<&Session> {
        self.current.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current.is_some()
    }
}
