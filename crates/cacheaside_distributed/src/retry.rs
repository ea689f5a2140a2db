// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::time::Duration;

/// Bounded retry schedule for distributed store calls.
///
/// A policy allows `retry_count` retries after the first attempt. The wait before retry
/// `n` (counted from zero) is the interval, or `interval * 2^n` with exponential backoff.
/// Delays saturate at [`Duration::MAX`].
///
/// # Examples
///
/// ```
/// use std::time::Duration;
///
/// use cacheaside_distributed::RetryPolicy;
///
/// let policy = RetryPolicy::new(3, Duration::from_millis(100)).with_exponential_backoff(true);
///
/// assert_eq!(policy.delay_for(0), Duration::from_millis(100));
/// assert_eq!(policy.delay_for(1), Duration::from_millis(200));
/// assert_eq!(policy.delay_for(2), Duration::from_millis(400));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    retry_count: u32,
    interval: Duration,
    exponential: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(100))
    }
}

impl RetryPolicy {
    /// Creates a policy with a constant wait between attempts.
    #[must_use]
    pub const fn new(retry_count: u32, interval: Duration) -> Self {
        Self {
            retry_count,
            interval,
            exponential: false,
        }
    }

    /// Creates a policy that never retries.
    #[must_use]
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Doubles the wait on every retry when `enabled`.
    #[must_use]
    pub const fn with_exponential_backoff(mut self, enabled: bool) -> Self {
        self.exponential = enabled;
        self
    }

    /// Number of retries allowed after the first attempt.
    #[must_use]
    pub const fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// The base wait between attempts.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the wait doubles on each retry.
    #[must_use]
    pub const fn is_exponential(&self) -> bool {
        self.exponential
    }

    /// The wait before retry number `attempt`, counted from zero.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        if !self.exponential {
            return self.interval;
        }

        2_u32
            .checked_pow(attempt)
            .and_then(|factor| self.interval.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }
}
