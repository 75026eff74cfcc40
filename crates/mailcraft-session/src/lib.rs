//! Browser-session plumbing: the session cookie, the session-id extractor and
//! the short-lived OAuth [`grant::Grant`] kept in server-side session state.

pub mod cookie;
pub mod extract;
pub mod grant;
