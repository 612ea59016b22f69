//! Destination platform abstraction.
//!
//! This module defines the `DestinationApi` trait the pipeline drives, the
//! error type its calls return, and the shared API rate limiter.
//!
//! # Example
//!
//! ```ignore
//! use feeder::feed::API_TIMEOUT;
//! use feeder::platform::{ApiError, ApiRateLimiter, DestinationApi};
//! use feeder::{Shutdown, StageError};
//!
//! async fn create<A: DestinationApi>(
//!     api: &A,
//!     limiter: &ApiRateLimiter,
//!     shutdown: &Shutdown,
//! ) -> Result<(), StageError> {
//!     limiter.wait_or_cancel(shutdown).await?;
//!     let call = api.create_repository(Some("brave-turing-42"), "octocat-hello");
//!     let repo = shutdown
//!         .race(tokio::time::timeout(API_TIMEOUT, call))
//!         .await?
//!         .map_err(|_| ApiError::timeout(API_TIMEOUT))??;
//!     println!("created {}", repo.full_name);
//!     Ok(())
//! }
//! ```

mod errors;
mod rate_limit;
mod types;

pub use errors::{ApiError, Result, short_error_message};
pub use rate_limit::{ApiRateLimiter, rate_limits};
pub use types::{CreatedRepo, DestinationApi};

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use crate::error::Cancelled;
    use crate::shutdown::Shutdown;

    use super::*;

    #[test]
    fn test_api_error_api() {
        let err = ApiError::api("Something went wrong");
        assert!(err.to_string().contains("API error"));
        assert!(err.to_string().contains("Something went wrong"));
    }

    #[test]
    fn test_api_error_network() {
        let err = ApiError::network("connection refused");
        assert!(err.to_string().contains("Network error"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_api_error_timeout() {
        let err = ApiError::timeout(Duration::from_secs(30));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_api_error_rate_limited_names_status() {
        let err = ApiError::RateLimited { status: 429 };
        assert!(err.to_string().contains("HTTP 429"));
    }

    #[test]
    fn test_short_error_message_takes_first_line() {
        let err = ApiError::api("first line\nsecond line");
        assert_eq!(short_error_message(&err), "API error: first line");
    }

    #[test]
    fn test_short_error_message_keeps_single_line() {
        let err = ApiError::internal("unexpected");
        assert_eq!(short_error_message(&err), "Internal error: unexpected");
    }

    #[tokio::test]
    async fn test_rate_limiter_allows_burst_then_throttles() {
        let limiter = ApiRateLimiter::new(5);

        let start = Instant::now();
        for _ in 0..5 {
            limiter.wait().await;
        }
        assert!(start.elapsed() < Duration::from_millis(100));

        limiter.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_rate_limiter_zero_rps_defaults_to_one() {
        let limiter = ApiRateLimiter::new(0);
        limiter.wait().await;
    }

    #[tokio::test]
    async fn test_wait_or_cancel_returns_cancelled_when_triggered() {
        let limiter = ApiRateLimiter::new(1);
        let shutdown = Shutdown::new();

        // Drain the only token so the next wait blocks.
        limiter.wait().await;

        let trigger = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.trigger();
        });

        let start = Instant::now();
        let result = limiter.wait_or_cancel(&shutdown).await;
        assert_eq!(result, Err(Cancelled));
        assert!(start.elapsed() < Duration::from_millis(900));
    }

    #[tokio::test]
    async fn test_wait_or_cancel_succeeds_with_tokens() {
        let limiter = ApiRateLimiter::new(10);
        let shutdown = Shutdown::new();
        assert_eq!(limiter.wait_or_cancel(&shutdown).await, Ok(()));
    }
}
