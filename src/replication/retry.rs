//! Bounded retry policy for the slave handshake
//!
//! Deterministic exponential backoff: the n-th wait is
//! `initial_delay * 2^(n-1)`, capped at `max_delay`.

use std::time::Duration;

/// How long and how often the slave waits for its threads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Status observations before giving up
    pub max_attempts: u32,
    /// Wait after the first observation
    pub initial_delay: Duration,
    /// Longest single wait
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// 30 attempts, 1s doubling to 5s
    pub const fn slave_default() -> Self {
        Self {
            max_attempts: 30,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(5),
        }
    }

    /// No waiting at all, for tests
    pub const fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }

    /// Wait after attempt `attempt` (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(31);
        let delay = self.initial_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }

    /// Whether another attempt is allowed after `attempt`
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Sum of every wait the policy can impose
    pub fn total_budget(&self) -> Duration {
        (1..self.max_attempts)
            .map(|attempt| self.delay_for(attempt))
            .fold(Duration::ZERO, |acc, d| acc.saturating_add(d))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::slave_default()
    }
}
