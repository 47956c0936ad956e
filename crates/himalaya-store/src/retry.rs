//! Retry with exponential back-off and jitter for the Airtable client.
//!
//! The whole load is already bounded by the store's timeout, so retries here
//! only smooth over brief blips; they never extend the caller's wait.

use std::future::Future;
use std::time::Duration;

use crate::error::AirtableError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** timeouts, connection failures, HTTP 429, HTTP 5xx.
///
/// **Not retriable:** credential rejections, missing tables, malformed
/// bodies, bad configuration, and the pagination guard.
pub(crate) fn is_retriable(err: &AirtableError) -> bool {
    match err {
        AirtableError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        AirtableError::RateLimited { .. } => true,
        AirtableError::UnexpectedStatus { status, .. } => *status >= 500,
        AirtableError::Unauthorized { .. }
        | AirtableError::NotFound { .. }
        | AirtableError::Deserialize { .. }
        | AirtableError::InvalidBaseUrl { .. }
        | AirtableError::PaginationLimit { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Back-off schedule with `backoff_base_ms = 250`:
///
/// | Attempt | Sleep before next attempt   |
/// |---------|-----------------------------|
/// | 1       | 250 ms × 2⁰ ± 25 % jitter   |
/// | 2       | 250 ms × 2¹ ± 25 % jitter   |
/// | 3       | 250 ms × 2² ± 25 % jitter   |
///
/// Delay is capped at 5 s. Non-retriable errors are returned immediately.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AirtableError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AirtableError>>,
{
    const MAX_DELAY_MS: u64 = 5_000;
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
                    "Airtable transient error, retrying after back-off"
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

    fn deserialize_err() -> AirtableError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        AirtableError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    #[test]
    fn unauthorized_is_not_retriable() {
        assert!(!is_retriable(&AirtableError::Unauthorized { status: 401 }));
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn rate_limited_is_retriable() {
        assert!(is_retriable(&AirtableError::RateLimited {
            retry_after_secs: 30
        }));
    }

    #[test]
    fn server_error_status_is_retriable_client_error_is_not() {
        assert!(is_retriable(&AirtableError::UnexpectedStatus {
            status: 503,
            url: "u".to_owned()
        }));
        assert!(!is_retriable(&AirtableError::UnexpectedStatus {
            status: 422,
            url: "u".to_owned()
        }));
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(2, 0, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(AirtableError::RateLimited {
                        retry_after_secs: 0,
                    })
                } else {
                    Ok::<u32, AirtableError>(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, AirtableError>(AirtableError::UnexpectedStatus {
                    status: 502,
                    url: "u".to_owned(),
                })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(matches!(
            result,
            Err(AirtableError::UnexpectedStatus { status: 502, .. })
        ));
    }

    #[tokio::test]
    async fn does_not_retry_unauthorized() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, AirtableError>(AirtableError::Unauthorized { status: 403 })
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(AirtableError::Unauthorized { .. })));
    }
}
