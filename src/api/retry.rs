//! Retry-with-backoff combinator shared by every endpoint.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::warn;

const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Retry policy for transport-level failures.
///
/// The first attempt is always made; `retries` further attempts follow, each
/// preceded by a backoff that starts at `initial_backoff` and doubles.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RetryPolicy {
    retries: u32,
    initial_backoff: Duration,
}

impl RetryPolicy {
    /// Exponential policy starting at `initial_backoff`.
    #[must_use]
    pub const fn exponential(retries: u32, initial_backoff: Duration) -> Self {
        Self {
            retries,
            initial_backoff,
        }
    }

    /// Exponential policy starting at one second.
    #[must_use]
    pub const fn with_retries(retries: u32) -> Self {
        Self::exponential(retries, DEFAULT_INITIAL_BACKOFF)
    }

    /// Policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::with_retries(0)
    }

    /// Number of retries after the first attempt.
    #[must_use]
    pub const fn retries(&self) -> u32 {
        self.retries
    }

    /// Backoff slept before retry number `retry` (zero-based).
    #[must_use]
    pub fn backoff(&self, retry: u32) -> Duration {
        let factor = 1_u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.initial_backoff.saturating_mul(factor)
    }

    /// Runs `operation` under this policy.
    ///
    /// # Errors
    ///
    /// Returns the last error once every retry has failed.
    pub async fn run<T, E, F, Fut>(&self, operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        retry(self.retries, |attempt| self.backoff(attempt), operation).await
    }
}

/// Calls `operation` until it succeeds or `retries` further attempts have
/// failed, sleeping `backoff(n)` before retry `n`.
///
/// # Errors
///
/// Returns the error of the final attempt.
pub async fn retry<T, E, F, Fut, B>(retries: u32, backoff: B, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    B: Fn(u32) -> Duration,
    E: std::fmt::Display,
{
    let mut last = match operation().await {
        Ok(value) => return Ok(value),
        Err(err) => err,
    };

    for attempt in 0..retries {
        let delay = backoff(attempt);
        warn!(
            attempt = attempt + 1,
            retries,
            backoff_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %last,
            "request failed, retrying"
        );
        sleep(delay).await;
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => last = err,
        }
    }

    Err(last)
}
