use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

use crate::error::Cancelled;
use crate::shutdown::Shutdown;

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Default rate limits (requests per second).
pub mod rate_limits {
    /// GitHub Enterprise: admin and repo creation endpoints, conservative default.
    pub const GHE_DEFAULT_RPS: u32 = 10;
}

/// Process-wide API rate limiter using the governor crate.
///
/// One instance is shared by every worker and gates every destination API
/// call: organization creation and repository creation alike.
///
/// # Example
///
/// ```ignore
/// use feeder::platform::ApiRateLimiter;
///
/// let limiter = ApiRateLimiter::new(10); // 10 requests per second
///
/// // Before each API call; the call itself then runs under the API deadline,
/// // raced against shutdown.
/// limiter.wait_or_cancel(&shutdown).await?;
/// let call = api.create_repository(Some("org"), "repo");
/// let repo = shutdown
///     .race(tokio::time::timeout(API_TIMEOUT, call))
///     .await?
///     .map_err(|_| ApiError::timeout(API_TIMEOUT))??;
/// ```
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter with the specified requests per second.
    ///
    /// # Arguments
    ///
    /// * `requests_per_second` - Maximum requests per second (defaults to 1 if 0)
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(rps));

        Self {
            inner: Arc::new(rate_limiter),
        }
    }

    /// Wait until a request is allowed by the rate limiter.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }

    /// Wait for a token, giving up if shutdown fires first.
    ///
    /// A cancelled wait returns [`Cancelled`], which callers keep apart from
    /// real API failures.
    pub async fn wait_or_cancel(&self, shutdown: &Shutdown) -> Result<(), Cancelled> {
        shutdown.race(self.wait()).await
    }
}

impl std::fmt::Debug for ApiRateLimiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiRateLimiter").finish_non_exhaustive()
    }
}
