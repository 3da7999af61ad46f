//! Retry pacing for poll loops.
//!
//! Poll loops catch transient read failures and try again next cycle; a
//! [`RetryStrategy`] decides how long to wait before each attempt and
//! when to give up. The wait itself is the caller's (loops use an
//! interruptible cancellation wait, not a bare sleep).

use std::time::Duration;

/// Pacing policy for retrying a failed operation.
pub trait RetryStrategy {
    /// Delay to wait before retrying after the given failed attempt
    /// (1-based), or `None` once attempts are exhausted.
    fn next_delay(&self, attempt: u32) -> Option<Duration>;
}

/// Fail immediately; the operation gets exactly one attempt.
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn next_delay(&self, _attempt: u32) -> Option<Duration> {
        None
    }
}

/// Retry up to `max_retries` times with a constant delay.
pub struct FixedDelay {
    pub delay: Duration,
    pub max_retries: u32,
}

impl FixedDelay {
    pub fn new(delay: Duration, max_retries: u32) -> Self {
        Self { delay, max_retries }
    }
}

impl RetryStrategy for FixedDelay {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        (attempt <= self.max_retries).then_some(self.delay)
    }
}

/// Retry with delays doubling from `initial` up to `max_delay`.
pub struct ExponentialBackoff {
    pub initial: Duration,
    pub max_delay: Duration,
    pub max_retries: u32,
}

impl ExponentialBackoff {
    pub fn new(initial: Duration, max_delay: Duration, max_retries: u32) -> Self {
        Self {
            initial,
            max_delay,
            max_retries,
        }
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: u32) -> Option<Duration> {
        if attempt > self.max_retries {
            return None;
        }
        let shift = (attempt.saturating_sub(1)).min(20);
        let delay = self.initial.saturating_mul(1u32 << shift);
        Some(delay.min(self.max_delay))
    }
}
