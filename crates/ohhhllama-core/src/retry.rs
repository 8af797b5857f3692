//! Retry policy for queue processing.
//!
//! The policy is pure data; the processor asks it how long to wait and does
//! the waiting through an injected [`Sleeper`](crate::ports::Sleeper), so
//! retry behavior is testable without real delays.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Delay schedule between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Backoff {
    /// Same delay before every retry.
    Fixed(Duration),
    /// `base * 2^(retry - 1)`, capped at `max`.
    Exponential { base: Duration, max: Duration },
}

/// How many times a job is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1 in practice.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_secs(30)),
        }
    }
}

impl RetryPolicy {
    pub const fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Fixed(delay),
        }
    }

    pub const fn exponential(max_attempts: u32, base: Duration, max: Duration) -> Self {
        Self {
            max_attempts,
            backoff: Backoff::Exponential { base, max },
        }
    }

    /// Whether another attempt is allowed after `attempt` (1-based) failed.
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay to wait before `attempt` (1-based). The first attempt never waits.
    pub fn delay_before(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        match self.backoff {
            Backoff::Fixed(delay) => delay,
            Backoff::Exponential { base, max } => {
                let exponent = (attempt - 2).min(31);
                base.checked_mul(1u32 << exponent).map_or(max, |d| d.min(max))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let policy = RetryPolicy::fixed(3, Duration::from_secs(10));
        assert_eq!(policy.delay_before(1), Duration::ZERO);
        assert_eq!(policy.delay_before(2), Duration::from_secs(10));
        assert_eq!(policy.delay_before(3), Duration::from_secs(10));
    }

    #[test]
    fn test_exponential_backoff_caps() {
        let policy =
            RetryPolicy::exponential(10, Duration::from_millis(500), Duration::from_secs(3));
        assert_eq!(policy.delay_before(2), Duration::from_millis(500));
        assert_eq!(policy.delay_before(3), Duration::from_secs(1));
        assert_eq!(policy.delay_before(4), Duration::from_secs(2));
        assert_eq!(policy.delay_before(5), Duration::from_secs(3));
        assert_eq!(policy.delay_before(40), Duration::from_secs(3));
    }

    #[test]
    fn test_should_retry() {
        let policy = RetryPolicy::fixed(3, Duration::ZERO);
        assert!(policy.should_retry(1));
        assert!(policy.should_retry(2));
        assert!(!policy.should_retry(3));
    }
}
