//! Bounded exponential-backoff retry for external calls.
//!
//! [`RetryPolicy::run`] invokes a call and, on failure, sleeps
//! `unit * backoff_factor^attempt` before trying again, up to `max_attempts`
//! calls in total. Every failure is retried the same way; once attempts are
//! exhausted the last error is returned unchanged. There is no jitter and no
//! delay cap.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// Default number of calls (first try included).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Default multiplier between successive backoff delays.
pub const DEFAULT_BACKOFF_FACTOR: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total calls allowed, including the first. Values below 1 behave as 1.
    pub max_attempts: u32,
    pub backoff_factor: u32,
    /// Delay unit multiplied by `backoff_factor^attempt` (1 second by default).
    pub unit: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_BACKOFF_FACTOR)
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff_factor: u32) -> Self {
        Self {
            max_attempts,
            backoff_factor,
            unit: Duration::from_secs(1),
        }
    }

    /// A policy that never retries.
    pub fn once() -> Self {
        Self::new(1, DEFAULT_BACKOFF_FACTOR)
    }

    /// Sleep taken after the failed attempt with 0-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let multiplier = u64::from(self.backoff_factor).saturating_pow(attempt);
        self.unit
            .saturating_mul(u32::try_from(multiplier).unwrap_or(u32::MAX))
    }

    /// Run `call` under this policy, sleeping on the tokio timer between attempts.
    pub async fn run<T, E, F, Fut>(&self, operation: &str, call: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.run_with_sleep(operation, call, tokio::time::sleep)
            .await
    }

    /// Like [`run`](Self::run) with a caller-supplied sleep function.
    pub async fn run_with_sleep<T, E, F, Fut, S, SFut>(
        &self,
        operation: &str,
        mut call: F,
        mut sleep: S,
    ) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
        S: FnMut(Duration) -> SFut,
        SFut: Future<Output = ()>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(operation, attempt, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) if attempt + 1 >= max_attempts => {
                    warn!(operation, attempts = max_attempts, error = %err, "giving up");
                    return Err(err);
                }
                Err(err) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying after failure"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
