//! Retry utilities with exponential backoff.
//!
//! Each attempt is bounded by its own timeout; only errors that report
//! themselves as transient are retried.

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use shorts_clients::ClientError;

/// Errors the retry loop can classify.
pub trait Retryable {
    /// Whether another attempt may succeed.
    fn is_retryable(&self) -> bool;

    /// Error for an attempt that exceeded its timeout.
    fn timed_out(operation: &'static str) -> Self;
}

impl Retryable for ClientError {
    fn is_retryable(&self) -> bool {
        ClientError::is_retryable(self)
    }

    fn timed_out(operation: &'static str) -> Self {
        ClientError::Timeout { service: operation }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not including the initial attempt).
    pub max_retries: u32,
    /// Base delay for exponential backoff (doubles each attempt).
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Timeout for a single attempt.
    pub call_timeout: Option<Duration>,
    /// Operation name for logging.
    pub operation_name: &'static str,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(8),
            call_timeout: None,
            operation_name: "operation",
        }
    }
}

impl RetryConfig {
    /// Create a new retry config with the given operation name.
    pub fn new(operation_name: &'static str) -> Self {
        Self {
            operation_name,
            ..Default::default()
        }
    }

    /// Set the maximum number of retries.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the base delay for exponential backoff.
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Bound every attempt by `timeout`.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    /// Delay before retry number `attempt` (1-based).
    fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Result of a retry operation.
#[derive(Debug)]
pub enum RetryResult<T, E> {
    /// Operation succeeded.
    Success(T),
    /// Operation failed with a permanent error or after all retries.
    Failed { error: E, attempts: u32 },
}

/// Execute an async operation with retry logic.
///
/// ```ignore
/// let config = RetryConfig::new("narration").with_max_retries(2);
/// let audio = retry_async(&config, || voice.synthesize(text)).await;
/// ```
pub async fn retry_async<F, Fut, T, E>(config: &RetryConfig, operation: F) -> RetryResult<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Retryable + std::fmt::Display,
{
    let mut attempt = 0u32;

    loop {
        let outcome = match config.call_timeout {
            Some(limit) => tokio::time::timeout(limit, operation())
                .await
                .unwrap_or_else(|_| Err(E::timed_out(config.operation_name))),
            None => operation().await,
        };

        match outcome {
            Ok(value) => return RetryResult::Success(value),
            Err(e) if attempt < config.max_retries && e.is_retryable() => {
                attempt += 1;
                let delay = config.delay_for_attempt(attempt);
                debug!(
                    operation = config.operation_name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retrying after transient failure"
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => {
                return RetryResult::Failed {
                    error: e,
                    attempts: attempt + 1,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> ClientError {
        ClientError::Unavailable {
            service: "test",
            status: 503,
            message: "busy".to_string(),
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let config = RetryConfig::new("test").with_base_delay(Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(1), Duration::from_millis(500));
        assert_eq!(config.delay_for_attempt(2), Duration::from_millis(1000));
        assert_eq!(config.delay_for_attempt(10), Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_are_retried() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new("test").with_max_retries(2);

        let result = retry_async(&config, || async {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(unavailable())
            } else {
                Ok(7)
            }
        })
        .await;

        assert!(matches!(result, RetryResult::Success(7)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new("test").with_max_retries(2);

        let result: RetryResult<(), _> = retry_async(&config, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(unavailable())
        })
        .await;

        match result {
            RetryResult::Failed { attempts, .. } => assert_eq!(attempts, 3),
            RetryResult::Success(_) => panic!("expected failure"),
        }
    }

    #[tokio::test]
    async fn test_permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new("test").with_max_retries(5);

        let result: RetryResult<(), _> = retry_async(&config, || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(ClientError::invalid_response("test", "garbage"))
        })
        .await;

        assert!(matches!(result, RetryResult::Failed { attempts: 1, .. }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_attempts_time_out_and_retry() {
        let calls = AtomicU32::new(0);
        let config = RetryConfig::new("slow")
            .with_max_retries(1)
            .with_call_timeout(Duration::from_secs(1));

        let result = retry_async(&config, || async {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
            Ok::<_, ClientError>("done")
        })
        .await;

        assert!(matches!(result, RetryResult::Success("done")));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
