//! Test utilities for mailcraft services.
//!
//! Provides `MockSession` for cookie-authenticated requests and JSON payload
//! builders shaped like the mail-provider and completion APIs.
//! Import in tests only, never in production code.

pub mod fixture;
pub mod session;
