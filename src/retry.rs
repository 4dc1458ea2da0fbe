//! Bounded retry with a fixed pause between attempts.
//!
//! Upstream failures are short network blips, so the policy has no
//! exponential growth and no circuit breaker: try up to `max_attempts`
//! times, sleeping `delay` in between, and hand back the last error.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Tunable parameters for a bounded retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first one. Zero is treated as one.
    pub max_attempts: u32,
    /// Pause after each failed attempt except the last.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, delay: Duration::from_secs(2) }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Policy without pauses, for tests and local sources.
    pub fn immediate(max_attempts: u32) -> Self {
        Self { max_attempts, delay: Duration::ZERO }
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// `what` names the operation in log output.
    pub async fn run<T, E, F, Fut>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match op().await {
                Ok(value) => return Ok(value),
                Err(e) if attempt < attempts => {
                    tracing::warn!(what, attempt, error = %e, "Attempt failed, retrying");
                    if !self.delay.is_zero() {
                        tokio::time::sleep(self.delay).await;
                    }
                }
                Err(e) => {
                    tracing::error!(what, attempts, error = %e, "Giving up after all attempts");
                    return Err(e);
                }
            }
        }
    }
}
