//! Retry wrapper — turns unreliable remote calls into predictable outcomes.
//!
//! Every backend call in this crate goes through [`with_retry`]: offline
//! short-circuit, error normalization into [`ApiError`], retry of transient
//! failures with exponential backoff, and propagation of the last error once
//! the budget is exhausted. The wrapper never swallows an error and never
//! runs two attempts of the same call concurrently.

use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;
use crate::net::connectivity::Connectivity;

/// Backoff growth factor per attempt.
const BACKOFF_FACTOR: f64 = 1.5;

/// Retry budget and backoff shape for a remote call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first (so `max_retries + 1` total).
    pub max_retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Grow the delay by 1.5× per attempt, or keep it constant.
    pub exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(1000),
            exponential: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before the given attempt (0-indexed; attempt 0 has no delay).
    ///
    /// With exponential backoff: `base × 1.5^attempt`, so a 100 ms base
    /// waits 150 ms before attempt 1 and 225 ms before attempt 2.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if self.exponential {
            self.base_delay.mul_f64(BACKOFF_FACTOR.powi(attempt as i32))
        } else {
            self.base_delay
        }
    }
}

/// Run `call`, retrying transient failures per `policy`.
///
/// The thunk must be re-invocable: each attempt calls it fresh. Behavior:
/// 1. If offline at call time, fail immediately with [`ApiError::Offline`]
///    without invoking the thunk.
/// 2. On success, return the value as-is.
/// 3. On failure, normalize into [`ApiError`]; only network errors and 5xx
///    are retried — 4xx propagates at once.
/// 4. Between attempts, re-check offline (a link that died mid-sequence
///    short-circuits instead of burning the remaining budget), then back off.
/// 5. After exhausting retries, the last normalized error propagates.
pub async fn with_retry<T, E, F, Fut>(
    connectivity: &dyn Connectivity,
    policy: &RetryPolicy,
    call: F,
) -> Result<T, ApiError>
where
    E: Into<ApiError>,
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    if connectivity.is_offline() {
        return Err(ApiError::Offline);
    }

    let mut attempt: u32 = 0;
    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(raw) => {
                let err: ApiError = raw.into();
                if !err.is_retryable() || attempt >= policy.max_retries {
                    return Err(err);
                }
                attempt += 1;
                tracing::warn!(
                    attempt,
                    max_retries = policy.max_retries,
                    error = %err,
                    "Remote call failed, retrying"
                );
                if connectivity.is_offline() {
                    return Err(ApiError::Offline);
                }
                tokio::time::sleep(policy.delay_for(attempt)).await;
            }
        }
    }
}
