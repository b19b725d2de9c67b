//! Bounded exponential backoff for store calls.

use std::future::Future;
use std::time::Duration;

use teamsync_core::{StoreError, StoreResult};
use tracing::{debug, warn};

/// Retry policy configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (0 = no retries).
    pub max_retries: u32,
    /// Base delay for exponential backoff.
    pub base_delay: Duration,
    /// Maximum delay cap.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Create a policy with the given max retries and base delay.
    /// The delay cap defaults to 5 seconds.
    #[must_use]
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
            ..Self::default()
        }
    }

    /// A policy that never retries.
    #[must_use]
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Override the delay cap.
    #[must_use]
    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Whether the error should be retried at the given attempt number.
    ///
    /// Only transient errors (unreachable store, server error, rate limit,
    /// timeout) are retried. Rejections and no-ops are returned at once.
    #[must_use]
    pub fn should_retry(&self, attempt: u32, error: &StoreError) -> bool {
        attempt < self.max_retries && error.is_transient()
    }

    /// Delay before the retry following `attempt`:
    /// `min(base_delay * 2^attempt, max_delay)`.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.max_delay)
    }

    /// Execute an async operation with retry.
    ///
    /// The closure is called until it succeeds, fails with a non-transient
    /// error, or the retries are used up. The last error is returned as is.
    pub async fn execute<F, Fut, T>(&self, operation_name: &str, mut f: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let mut attempt: u32 = 0;
        loop {
            match f().await {
                Ok(value) => {
                    if attempt > 0 {
                        debug!(
                            operation = operation_name,
                            attempt = attempt + 1,
                            "Store call succeeded after retries"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => {
                    if !self.should_retry(attempt, &error) {
                        if error.is_transient() {
                            warn!(
                                operation = operation_name,
                                attempts = attempt + 1,
                                error = %error,
                                "Store call failed after retries"
                            );
                        }
                        return Err(error);
                    }

                    let delay = self.delay_for(attempt);
                    debug!(
                        operation = operation_name,
                        attempt = attempt + 1,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying store call after transient error"
                    );

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 2);
        assert_eq!(policy.base_delay, Duration::from_millis(200));
        assert_eq!(policy.max_delay, Duration::from_secs(5));
    }

    #[test]
    fn test_should_retry_transient_only() {
        let policy = RetryPolicy::new(3, Duration::ZERO);

        assert!(policy.should_retry(0, &StoreError::unavailable("503")));
        assert!(policy.should_retry(2, &StoreError::Timeout { timeout_secs: 1 }));
        assert!(!policy.should_retry(3, &StoreError::unavailable("503"))); // at max

        assert!(!policy.should_retry(0, &StoreError::rejected("Missing Permissions")));
        assert!(!policy.should_retry(0, &StoreError::unauthorized("401")));
        assert!(!policy.should_retry(0, &StoreError::AlreadyPresent));
    }

    #[test]
    fn test_delay_exponential_backoff() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100));

        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        assert_eq!(policy.delay_for(3), Duration::from_millis(800));
    }

    #[test]
    fn test_delay_capped_at_max() {
        let policy =
            RetryPolicy::new(10, Duration::from_secs(1)).with_max_delay(Duration::from_secs(10));

        assert_eq!(policy.delay_for(5), Duration::from_secs(10)); // 32 capped to 10
        assert_eq!(policy.delay_for(31), Duration::from_secs(10));
        assert_eq!(policy.delay_for(64), Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_execute_succeeds_after_retries() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result = policy
            .execute("test_op", move || {
                let counter = counter_clone.clone();
                async move {
                    if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(StoreError::unavailable("connection reset"))
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(counter.load(Ordering::SeqCst), 3); // initial + 2 retries
    }

    #[tokio::test]
    async fn test_execute_rejection_fails_immediately() {
        let policy = RetryPolicy::new(3, Duration::ZERO);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: StoreResult<()> = policy
            .execute("test_op", move || {
                let counter = counter_clone.clone();
                async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Err(StoreError::rejected("Missing Access"))
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), StoreError::rejected("Missing Access"));
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_execute_returns_last_error_when_exhausted() {
        let policy = RetryPolicy::new(2, Duration::ZERO);
        let counter = Arc::new(AtomicU32::new(0));
        let counter_clone = counter.clone();

        let result: StoreResult<()> = policy
            .execute("test_op", move || {
                let counter = counter_clone.clone();
                async move {
                    let n = counter.fetch_add(1, Ordering::SeqCst);
                    Err(StoreError::unavailable(format!("attempt {n}")))
                }
            })
            .await;

        assert_eq!(result.unwrap_err(), StoreError::unavailable("attempt 2"));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_no_retries_policy() {
        let policy = RetryPolicy::none();
        assert!(!policy.should_retry(0, &StoreError::unavailable("down")));
    }
}
