//! Proactive rate limiting for remote API calls.

use std::num::NonZeroU32;
use std::sync::Arc;

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};

/// Type alias for the governor rate limiter.
type GovernorRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Conservative default: the remote service allows ~60 requests/minute for
/// client-credentials tokens.
pub const DEFAULT_RPS: u32 = 1;

/// A shared API rate limiter using the governor crate.
///
/// The sync loops call [`ApiRateLimiter::wait`] before every remote request.
/// This is proactive pacing on top of (not instead of) the reactive throttle
/// handling in `sync::retry`.
#[derive(Clone)]
pub struct ApiRateLimiter {
    inner: Arc<GovernorRateLimiter>,
}

impl ApiRateLimiter {
    /// Create a new rate limiter allowing `requests_per_second` requests
    /// (clamped to at least 1).
    pub fn new(requests_per_second: u32) -> Self {
        let rps = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        Self {
            inner: Arc::new(RateLimiter::direct(Quota::per_second(rps))),
        }
    }

    /// Wait until the next request is allowed.
    pub async fn wait(&self) {
        self.inner.until_ready().await;
    }
}

impl Default for ApiRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_RPS)
    }
}
