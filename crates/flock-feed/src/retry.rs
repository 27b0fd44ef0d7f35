//! Retry with exponential back-off and jitter for replay page requests.
//!
//! [`retry_with_backoff`] wraps a fallible page request and retries transient
//! failures. Back-off sleeps race the shutdown signal, so a cancelled run
//! never waits out a delay.

use std::future::Future;
use std::time::Duration;

use crate::error::FeedError;
use crate::shutdown::Shutdown;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// Network failures, rate limiting (429), and 5xx responses are transient.
/// Client errors and unreadable bodies are not: retrying returns the same
/// answer.
pub(crate) fn is_retriable(err: &FeedError) -> bool {
    match err {
        FeedError::Http(e) => {
            e.is_timeout()
                || e.is_connect()
                || e.is_request()
                || e.is_body()
                || e.status().is_some_and(|s| s.is_server_error())
        }
        FeedError::UnexpectedStatus { status, .. } => *status == 429 || *status >= 500,
        FeedError::StreamClosed | FeedError::Stalled { .. } | FeedError::LineTooLong { .. } => {
            true
        }
        FeedError::Deserialize { .. } | FeedError::NotConnected | FeedError::Cancelled => false,
    }
}

/// Delay before retry number `attempt` (1-based): `base × 2^(attempt-1)`,
/// capped at 60 s, with ±25 % jitter.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub(crate) fn backoff_delay(backoff_base_ms: u64, attempt: u32) -> Duration {
    const MAX_DELAY_MS: u64 = 60_000;
    let computed = backoff_base_ms.saturating_mul(1u64 << attempt.saturating_sub(1).min(10));
    let capped = computed.min(MAX_DELAY_MS);
    let jittered = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
    Duration::from_millis(jittered)
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors. Returns [`FeedError::Cancelled`] if shutdown fires during a
/// back-off; `on_retry` is called once per scheduled retry.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    shutdown: &mut Shutdown,
    mut on_retry: impl FnMut(),
    mut operation: F,
) -> Result<T, FeedError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FeedError>>,
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
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %err,
                    "search request failed; retrying after back-off"
                );
                on_retry();
                if !shutdown.sleep(delay).await {
                    return Err(FeedError::Cancelled);
                }
            }
        }
    }
}
