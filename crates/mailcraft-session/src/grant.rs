//! Short-lived OAuth grant held in server-side session state.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Authorization grant for one mailbox, obtained from the OAuth code exchange.
///
/// The provider grant id is opaque. `expires_at` bounds how long the session
/// may use it; past that point the user must re-authenticate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub grant_id: String,
    pub email: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Grant {
    pub fn new(grant_id: impl Into<String>, email: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();
        Self {
            grant_id: grant_id.into(),
            email,
            issued_at: now,
            expires_at: now + ttl,
        }
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Seconds left before expiry, zero once expired.
    pub fn remaining_secs(&self) -> u64 {
        (self.expires_at - Utc::now()).num_seconds().max(0) as u64
    }
}
