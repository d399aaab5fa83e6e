//! Back-off policy for provider HTTP calls.
//!
//! Connect failures and 5xx responses are retried. Timeouts are not: they
//! surface as [`wander_core::SuggestError::Timeout`] on the first occurrence,
//! exactly like a quota response.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::ProviderError;

const MAX_DELAY_MS: u64 = 10_000;

/// Whether `err` is a transient failure worth another attempt.
pub(crate) fn is_retriable(err: &ProviderError) -> bool {
    match err {
        ProviderError::Http(e) if e.is_timeout() => false,
        ProviderError::Http(e) => e.is_connect() || e.status().is_some_and(|s| s.is_server_error()),
        ProviderError::UnexpectedStatus { status, .. } => *status >= 500,
        ProviderError::QuotaExceeded(_)
        | ProviderError::Api { .. }
        | ProviderError::Deserialize { .. }
        | ProviderError::InvalidBaseUrl { .. } => false,
    }
}

/// Nominal wait before retry number `retry` (1-based): `base * 2^(retry-1)`,
/// capped at 10 s.
fn nominal_delay_ms(backoff_base_ms: u64, retry: u32) -> u64 {
    let exponent = retry.saturating_sub(1).min(10);
    backoff_base_ms.saturating_mul(1u64 << exponent).min(MAX_DELAY_MS)
}

/// Applies ±25 % jitter to `nominal_ms`.
fn jittered(nominal_ms: u64, rng: &mut impl Rng) -> Duration {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let ms = (nominal_ms as f64 * rng.random_range(0.75..=1.25)) as u64;
    Duration::from_millis(ms)
}

/// Runs `operation`, retrying transient failures up to `max_retries` times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut retry = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && retry < max_retries => err,
            Err(err) => return Err(err),
        };

        retry += 1;
        let delay = jittered(nominal_delay_ms(backoff_base_ms, retry), &mut rand::rng());
        tracing::warn!(
            retry,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "transient provider failure, backing off"
        );
        tokio::time::sleep(delay).await;
    }
}
