//! Retry with backoff for remote calls.
//!
//! A [`RetryPolicy`] is a value: attempt budget, first delay, growth factor
//! and a predicate deciding which errors are worth another attempt. The same
//! executor drives group membership writes, role grants and station polling.

use crate::error::{ProvisionError, ProvisionResult};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Decides whether an error is worth another attempt.
pub type RetryPredicate = fn(&ProvisionError) -> bool;

#[derive(Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts including the first one.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub initial_delay: Duration,
    /// Growth factor applied to the delay after each further failure.
    pub multiplier: u32,
    pub retryable: RetryPredicate,
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("initial_delay", &self.initial_delay)
            .field("multiplier", &self.multiplier)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy {
    /// Create a policy that retries transient errors.
    #[must_use]
    pub fn new(max_attempts: u32, initial_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts,
            initial_delay,
            multiplier,
            retryable: ProvisionError::is_transient,
        }
    }

    /// Versioned group membership writes: 5 attempts, 200ms doubling.
    #[must_use]
    pub fn group_membership() -> Self {
        Self::new(5, Duration::from_millis(200), 2)
    }

    /// Role grants: same schedule as group writes.
    #[must_use]
    pub fn role_membership() -> Self {
        Self::new(5, Duration::from_millis(200), 2)
    }

    /// Station index polling: 6 attempts, flat 1000ms.
    #[must_use]
    pub fn station_lookup() -> Self {
        Self::new(6, Duration::from_secs(1), 1)
    }

    /// Replace the retryable-error predicate.
    #[must_use]
    pub fn with_retryable(mut self, retryable: RetryPredicate) -> Self {
        self.retryable = retryable;
        self
    }

    /// Delay to wait after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .multiplier
            .saturating_pow(attempt.saturating_sub(1));
        self.initial_delay.saturating_mul(factor)
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent.
    ///
    /// Exhausting the budget yields [`ProvisionError::RetryExhausted`]
    /// wrapping the last error; a non-retryable error is returned as is.
    pub async fn execute<F, Fut, T>(&self, operation: &str, mut f: F) -> ProvisionResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProvisionResult<T>>,
    {
        let mut attempt: u32 = 1;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(operation, attempt, "Operation succeeded after retries");
                    }
                    return Ok(value);
                }
                Err(error) if !(self.retryable)(&error) => return Err(error),
                Err(error) if attempt >= self.max_attempts => {
                    warn!(operation, attempts = attempt, error = %error, "Retries exhausted");
                    return Err(ProvisionError::RetryExhausted {
                        operation: operation.to_string(),
                        attempts: attempt,
                        source: Box::new(error),
                    });
                }
                Err(error) => {
                    let delay = self.delay_after(attempt);
                    debug!(
                        operation,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying after transient error"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}
