//! Push retry policy.
//!
//! Pushes are the one stage that is retried. The policy is an exponential
//! backoff built with `backon`; [`RetryConfig::attempts`] counts the first
//! try, so a config with `attempts = 3` runs the operation at most three
//! times.

use std::time::Duration;

use backon::ExponentialBuilder;

/// Default total push attempts (first try included).
pub const DEFAULT_PUSH_ATTEMPTS: usize = 3;

/// Default delay before the first push retry, in milliseconds.
pub const DEFAULT_RETRY_MIN_DELAY_MS: u64 = 1_000;

/// Default ceiling on the delay between push retries, in milliseconds.
pub const DEFAULT_RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Configuration for retry operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Minimum delay between retries.
    pub min_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Maximum number of attempts, including the first one.
    pub attempts: usize,
    /// Whether to add jitter to delays.
    pub with_jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_millis(DEFAULT_RETRY_MIN_DELAY_MS),
            max_delay: Duration::from_millis(DEFAULT_RETRY_MAX_DELAY_MS),
            attempts: DEFAULT_PUSH_ATTEMPTS,
            with_jitter: true,
        }
    }
}

impl RetryConfig {
    /// Create a new retry configuration with custom values.
    #[must_use]
    pub fn new(min_delay: Duration, max_delay: Duration, attempts: usize) -> Self {
        Self {
            min_delay,
            max_delay,
            attempts,
            with_jitter: true,
        }
    }

    /// Set whether to use jitter.
    #[must_use]
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.with_jitter = jitter;
        self
    }

    /// Number of retries after the first attempt. Zero attempts behaves like one.
    pub fn retries(&self) -> usize {
        self.attempts.max(1) - 1
    }

    /// Build an exponential backoff strategy from this configuration.
    #[must_use]
    pub fn into_backoff(self) -> ExponentialBuilder {
        let mut builder = ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_max_times(self.retries());

        if self.with_jitter {
            builder = builder.with_jitter();
        }

        builder
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use backon::Retryable;

    use super::*;

    #[test]
    fn default_config() {
        let config = RetryConfig::default();
        assert_eq!(config.min_delay, Duration::from_secs(1));
        assert_eq!(config.max_delay, Duration::from_secs(30));
        assert_eq!(config.attempts, 3);
        assert_eq!(config.retries(), 2);
        assert!(config.with_jitter);
    }

    #[test]
    fn zero_attempts_means_single_try() {
        let config = RetryConfig::new(Duration::ZERO, Duration::ZERO, 0);
        assert_eq!(config.retries(), 0);
    }

    #[test]
    fn without_jitter() {
        assert!(!RetryConfig::default().with_jitter(false).with_jitter);
    }

    #[tokio::test]
    async fn backoff_runs_exactly_the_configured_attempts() {
        let calls = Arc::new(AtomicUsize::new(0));
        let config = RetryConfig::new(Duration::from_millis(1), Duration::from_millis(2), 4)
            .with_jitter(false);

        let op = {
            let calls = Arc::clone(&calls);
            move || {
                let calls = Arc::clone(&calls);
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(std::io::Error::other("rejected"))
                }
            }
        };

        let result = op.retry(config.into_backoff()).await;

        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }
}
