//! Bounded retry for remote generation calls.
//!
//! Only errors that [`StudioError::is_retryable`] accepts are re-attempted;
//! anything else is returned on the first failure.

use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_retry::RetryIf;

use crate::error::{Result, StudioError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// `base_delay * attempt`
    Linear,
    /// `base_delay * 2^(attempt - 1)`
    Exponential,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(1000),
            backoff: Backoff::Linear,
        }
    }
}

impl RetryPolicy {
    pub fn new() -> Self {
        Self::default()
    }

    /// A policy of zero attempts is clamped to one.
    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn with_base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    pub fn with_backoff(mut self, backoff: Backoff) -> Self {
        self.backoff = backoff;
        self
    }

    /// Delay to wait after the given (1-based) failed attempt.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Linear => self.base_delay.saturating_mul(attempt),
            Backoff::Exponential => {
                let factor = 1u32.checked_shl(attempt.saturating_sub(1)).unwrap_or(u32::MAX);
                self.base_delay.saturating_mul(factor)
            }
        }
    }

    /// Waits between consecutive attempts; one fewer than `max_attempts`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (1..self.max_attempts.max(1)).map(move |attempt| self.delay_for(attempt))
    }
}

/// Runs `operation` until it succeeds, fails terminally, or the attempt
/// budget is spent. The last error is returned after exhaustion.
pub async fn retry_with_policy<F, Fut, T>(policy: &RetryPolicy, mut operation: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let attempts = AtomicU32::new(0);

    let result = RetryIf::spawn(
        policy.delays(),
        || {
            attempts.fetch_add(1, Ordering::SeqCst);
            operation()
        },
        |err: &StudioError| {
            let attempt = attempts.load(Ordering::SeqCst);
            if !err.is_retryable() {
                log::debug!("Terminal error on attempt {}: {}", attempt, err);
                return false;
            }
            if attempt < max_attempts {
                log::warn!(
                    "Attempt {}/{} failed with retryable error: {}. Retrying in {}ms",
                    attempt,
                    max_attempts,
                    err,
                    policy.delay_for(attempt).as_millis()
                );
            } else {
                log::error!("Giving up after {} attempts: {}", attempt, err);
            }
            true
        },
    )
    .await;

    let attempt = attempts.load(Ordering::SeqCst);
    if result.is_ok() && attempt > 1 {
        log::info!("Generation succeeded on attempt {}/{}", attempt, max_attempts);
    }
    result
}
