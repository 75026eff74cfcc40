//! Shared plumbing for mailcraft services: configuration, tracing, HTTP
//! middleware, health probes and the retry wrapper used at every external-call
//! boundary.

pub mod config;
pub mod health;
pub mod middleware;
pub mod retry;
pub mod serde;
pub mod tracing;
