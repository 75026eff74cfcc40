//! Session-cookie helpers for integration tests.
//!
//! Handlers resolve the caller's grant from the session cookie. `MockSession`
//! produces that cookie for a fixed id so tests can seed a grant store under
//! the same id.

use mailcraft_session::cookie::{SESSION_COOKIE, new_session_id};

pub struct MockSession {
    pub session_id: String,
}

impl MockSession {
    pub fn new() -> Self {
        Self {
            session_id: new_session_id(),
        }
    }

    /// `name=value` pair for a `Cookie` header.
    pub fn cookie(&self) -> String {
        format!("{SESSION_COOKIE}={}", self.session_id)
    }
}

impl Default for MockSession {
    fn default() -> Self {
        Self::new()
    }
}
