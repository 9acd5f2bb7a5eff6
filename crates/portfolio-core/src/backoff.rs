//! Retry policy with full-jitter exponential backoff

use rand::Rng;
use std::time::Duration;

/// How many times to call the transport and how long to wait in between
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,

    /// Base of the exponential cap
    pub base_delay: Duration,

    /// Upper bound of the exponential cap
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            base_delay: Duration::from_millis(2000),
            max_delay: Duration::from_millis(15000),
        }
    }
}

impl RetryPolicy {
    /// Upper bound of the delay after failed attempt `attempt` (1-based):
    /// `min(base_delay * 2^attempt, max_delay)`
    pub fn delay_cap(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let max_ms = self.max_delay.as_millis() as u64;
        let factor = 2u64.checked_pow(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(base_ms.saturating_mul(factor).min(max_ms))
    }

    /// Delay drawn uniformly from `[0, delay_cap(attempt)]` milliseconds
    pub fn jittered_delay<R: Rng>(&self, attempt: u32, rng: &mut R) -> Duration {
        let cap_ms = self.delay_cap(attempt).as_millis() as u64;
        Duration::from_millis(rng.gen_range(0..=cap_ms))
    }

    /// Same as [`Self::jittered_delay`] using the thread-local generator
    pub fn next_delay(&self, attempt: u32) -> Duration {
        self.jittered_delay(attempt, &mut rand::thread_rng())
    }
}
