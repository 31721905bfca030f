//! Retry policy shared by destination resolution and appends.

use super::interval::{ExponentialInterval, SharedIntervalProvider};
use crate::error::LogsError;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default number of retries after the initial call.
pub const DEFAULT_RETRIES: u32 = 5;

/// Runs an operation, retrying retryable failures with backoff.
///
/// The operation is called once and then retried up to `retries` more
/// times while [`LogsError::is_retryable`] holds. Before retry `n`
/// (starting at 1) the policy sleeps `interval.get_interval(n)`.
#[derive(Clone)]
pub struct RetryPolicy {
    retries: u32,
    interval: SharedIntervalProvider,
}

impl RetryPolicy {
    /// Create a retry policy.
    pub fn new(retries: u32, interval: SharedIntervalProvider) -> Self {
        Self { retries, interval }
    }

    /// Create a policy that never retries.
    pub fn no_retry() -> Self {
        Self::new(0, super::interval::no_delay())
    }

    /// Retry ceiling.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Interval provider driving the backoff.
    pub fn interval(&self) -> &SharedIntervalProvider {
        &self.interval
    }

    /// Execute an operation with retry logic.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut operation: F) -> Result<T, LogsError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, LogsError>>,
    {
        let mut attempt: u32 = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            retries = attempt,
                            "Operation succeeded after retry"
                        );
                    }
                    return Ok(result);
                }
                Err(error) => {
                    if !error.is_retryable() {
                        return Err(error);
                    }
                    if attempt >= self.retries {
                        warn!(
                            operation = operation_name,
                            retries = attempt,
                            error = %error,
                            "Operation failed after all retries"
                        );
                        return Err(error);
                    }

                    attempt += 1;
                    let backoff = self.interval.get_interval(attempt);
                    debug!(
                        operation = operation_name,
                        attempt = attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %error,
                        "Retrying operation after backoff"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_RETRIES, Arc::new(ExponentialInterval::default()))
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("retries", &self.retries)
            .finish_non_exhaustive()
    }
}
