//! Retry with linear backoff for transient search-API errors.
//!
//! The upstream search endpoint throttles informally rather than with a
//! `Retry-After` contract, so retries use short, evenly spaced delays instead
//! of an exponential schedule. Non-retriable errors (other 4xx, parse
//! failures) are propagated immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ScraperError;

/// Returns `true` if `err` represents a transient condition that should be
/// retried after a backoff delay.
///
/// Retriable errors:
/// - [`ScraperError::RateLimited`] — HTTP 429; the server has asked us to back off.
/// - [`ScraperError::ServerStatus`] — 5xx; presumed transient upstream trouble.
/// - [`ScraperError::Http`] — network-level failure (connection reset, timeout, etc.).
///
/// Non-retriable errors (propagated immediately):
/// - [`ScraperError::ClientRequest`] — non-429 4xx; the request itself is
///   malformed, retrying returns the same answer.
/// - [`ScraperError::Deserialize`] — response body does not parse; retrying won't fix it.
fn is_retriable(err: &ScraperError) -> bool {
    matches!(
        err,
        ScraperError::RateLimited { .. }
            | ScraperError::ServerStatus { .. }
            | ScraperError::Http(_)
    )
}

/// Pure backoff schedule: the delay before retry `n` (1-based) is
/// `base_ms × n` milliseconds.
#[must_use]
pub fn backoff_delay(base_ms: u64, retry_number: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(retry_number)))
}

/// Executes `operation` with linear-backoff retries on transient errors.
///
/// On a retriable error the function sleeps for `backoff_delay(base_ms, n)`
/// and tries again, up to `max_retries` additional attempts after the first
/// try. If all retries are exhausted the last error is returned.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ScraperError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ScraperError>>,
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
                let delay = backoff_delay(backoff_base_ms, attempt);
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "transient search error — retrying after backoff"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}
