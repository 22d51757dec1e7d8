//! Retry with exponential back-off and jitter for render requests.
//!
//! Rate limits, 5xx responses, and connection-level failures are retried.
//! Anything else is returned immediately: a malformed job or response will
//! not render on a second try.

use std::future::Future;
use std::time::Duration;

use crate::error::RenderError;

const MAX_DELAY_MS: u64 = 30_000;

pub(crate) fn is_retriable(err: &RenderError) -> bool {
    match err {
        RenderError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        RenderError::RateLimited { .. } | RenderError::ServerError { .. } => true,
        RenderError::UnexpectedStatus { .. }
        | RenderError::Deserialize { .. }
        | RenderError::InvalidEndpoint { .. }
        | RenderError::Rejected { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Sleeps `backoff_base_ms × 2^(attempt-1)` with ±25% jitter between
/// attempts, capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, RenderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, RenderError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient render error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn server_error() -> RenderError {
        RenderError::ServerError {
            backend: "cloud-a".to_owned(),
            status: 503,
        }
    }

    #[test]
    fn rate_limit_and_server_errors_are_retriable() {
        assert!(is_retriable(&server_error()));
        assert!(is_retriable(&RenderError::RateLimited {
            backend: "cloud-a".to_owned()
        }));
    }

    #[test]
    fn client_errors_are_not_retriable() {
        assert!(!is_retriable(&RenderError::UnexpectedStatus {
            backend: "cloud-a".to_owned(),
            status: 400
        }));
        assert!(!is_retriable(&RenderError::Rejected {
            backend: "cloud-a".to_owned(),
            reason: "unsupported codec".to_owned()
        }));
    }

    #[tokio::test]
    async fn retries_until_success() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(server_error())
                } else {
                    Ok("done")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(server_error())
            }
        })
        .await;
        assert!(matches!(result, Err(RenderError::ServerError { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retriable_error_returns_immediately() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result: Result<(), _> = retry_with_backoff(5, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err(RenderError::UnexpectedStatus {
                    backend: "cloud-a".to_owned(),
                    status: 422,
                })
            }
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
