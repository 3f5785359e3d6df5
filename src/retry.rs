//! Transport-level retry for provider requests.
//!
//! Only the HTTP layer retries; callers above it see the final error. Which
//! failures are retried is decided by `Error::is_retryable`.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Attempts including the first one; 0 is treated as 1
    pub max_attempts: u32,
    /// Pause before the first retry
    pub initial_delay: Duration,
    pub max_delay: Duration,
    /// Growth factor of the pause between consecutive retries
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    pub fn new(max_attempts: u32, initial_delay: Duration) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// DeepL requests: one retry after one second
    pub fn provider_call() -> Self {
        Self::new(2, Duration::from_secs(1)).with_max_delay(Duration::from_secs(1))
    }

    /// No retries at all
    pub fn none() -> Self {
        Self::new(1, Duration::ZERO)
    }

    /// Pause after the `failed`-th failed attempt (1-based)
    fn pause_after(&self, failed: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(failed.saturating_sub(1) as i32);
        let pause = self.initial_delay.mul_f64(factor.min(1e6));
        pause.min(self.max_delay)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::provider_call()
    }
}

/// Run `request` until it succeeds, fails with a non-retryable error, or the
/// attempts are used up. The last error is returned unchanged.
pub async fn send_with_retry<T, F, Fut>(
    config: &RetryConfig,
    operation: &str,
    mut request: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = config.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        match request().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!("{} succeeded on attempt {}/{}", operation, attempt, attempts);
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && attempt < attempts => {
                let pause = config.pause_after(attempt);
                warn!(
                    "{} failed on attempt {}/{} ({}), retrying in {:?}",
                    operation, attempt, attempts, e, pause
                );
                sleep(pause).await;
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    warn!("{} failed after {} attempt(s): {}", operation, attempt, e);
                } else {
                    debug!("{} failed with a non-retryable error: {}", operation, e);
                }
                return Err(e);
            }
        }
    }
}
