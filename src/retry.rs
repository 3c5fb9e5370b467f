//! Retry policy for rate-limited fetches
//!
//! Rate limiting is expected to be transient and self-clearing, so a
//! rate-limited operation is retried indefinitely after a fixed back-off.
//! Every other failure class is permanent: it is returned to the caller
//! immediately, who logs it and abandons the task. The worker executing the
//! back-off sleeps in place and is unavailable for other tasks for the
//! duration — a deliberate trade of pool capacity for simplicity.

use crate::error::Result;
use std::future::Future;
use std::time::Duration;

/// Execute an async operation, retrying forever on rate-limit failures.
///
/// Returns the first success or the first non-rate-limit error. Each
/// rate-limit failure is logged and followed by one fixed `backoff` sleep
/// before the operation restarts from scratch.
pub async fn with_rate_limit_retry<F, Fut, T>(backoff: Duration, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt: u64 = 0;
    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "Operation succeeded after back-off");
                }
                return Ok(result);
            }
            Err(error) if error.is_rate_limited() => {
                attempt += 1;
                tracing::warn!(
                    %error,
                    attempt,
                    backoff_secs = backoff.as_secs(),
                    "Rate limited, backing off before retry"
                );
                tokio::time::sleep(backoff).await;
            }
            Err(error) => return Err(error),
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> Error {
        Error::RateLimited {
            message: "(#4) Application request limit reached".to_string(),
        }
    }

    #[tokio::test]
    async fn success_returns_without_sleeping() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let start = std::time::Instant::now();
        let result = with_rate_limit_retry(Duration::from_secs(60), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(start.elapsed() < Duration::from_secs(1), "no back-off taken");
    }

    #[tokio::test]
    async fn m_rate_limit_failures_mean_m_backoffs_then_success() {
        let backoff = Duration::from_millis(30);
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let start = std::time::Instant::now();
        let result = with_rate_limit_retry(backoff, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 3 {
                    Err(rate_limited())
                } else {
                    Ok("rows")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "rows");
        assert_eq!(calls.load(Ordering::SeqCst), 4, "3 failures + 1 success");
        assert!(
            start.elapsed() >= backoff * 3,
            "one full back-off per failure, elapsed {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn non_rate_limit_error_returns_after_a_single_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<()> = with_rate_limit_retry(Duration::from_secs(60), || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(Error::Remote {
                    kind: "GraphMethodException".to_string(),
                    message: "Unsupported get request".to_string(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Remote { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1, "permanent errors never retry");
    }

    #[tokio::test]
    async fn rate_limit_followed_by_permanent_error_stops_retrying() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);

        let result: Result<()> = with_rate_limit_retry(Duration::from_millis(5), || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(rate_limited())
                } else {
                    Err(Error::Remote {
                        kind: "OAuthException".to_string(),
                        message: "permissions revoked".to_string(),
                    })
                }
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Remote { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
