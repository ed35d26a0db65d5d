//! Reactive retry discipline for throttled remote calls.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::api::{ApiError, Result};

/// Retry `op` indefinitely with a fixed delay while it fails with a
/// throttling signal. Every other outcome (success, not-found, any other
/// error) is returned to the caller unchanged.
///
/// Only safe for idempotent re-fetches; callers for which blind retry is not
/// modelled should let `RateLimited` propagate and rely on their next claim
/// cycle instead.
pub async fn retry_on_throttle<T, F, Fut>(delay: Duration, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    loop {
        match op().await {
            Err(error) if error.is_rate_limited() => {
                warn!(
                    delay_ms = delay.as_millis() as u64,
                    "remote API throttled, waiting before retry"
                );
                tokio::time::sleep(delay).await;
            }
            outcome => return outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_throttle_clears() {
        let attempts = AtomicU32::new(0);
        let result = retry_on_throttle(Duration::from_secs(5), || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 3 {
                    Err(ApiError::RateLimited)
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_other_errors_propagate_immediately() {
        let attempts = AtomicU32::new(0);
        let result: Result<()> = retry_on_throttle(Duration::from_secs(5), || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::not_found("users/7")) }
        })
        .await;
        assert!(result.unwrap_err().is_not_found());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
