//! Retry budget for lock acquisition.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of acquisition attempts.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 7;

/// Default delay after the first failed attempt.
pub const DEFAULT_BASE_DELAY_MS: u64 = 100;

/// Default ceiling on a single backoff delay.
pub const DEFAULT_MAX_DELAY_MS: u64 = 4_000;

/// Exponential backoff budget: `min(base * 2^attempt, max)` after each
/// failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub const fn new(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts,
            // Sub-millisecond precision is not meaningful for store round trips.
            base_delay_ms: base_delay.as_millis() as u64,
            max_delay_ms: max_delay.as_millis() as u64,
        }
    }

    pub const fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Delay to wait after the failed attempt with zero-based index `attempt`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        let delay_ms = self.base_delay_ms.saturating_mul(factor);
        Duration::from_millis(delay_ms.min(self.max_delay_ms))
    }

    /// Full sequence of inter-attempt delays for this budget.
    pub fn schedule(&self) -> Vec<Duration> {
        (0..self.max_attempts).map(|a| self.delay_for(a)).collect()
    }

    /// Worst-case time spent waiting before giving up.
    pub fn worst_case_wait(&self) -> Duration {
        self.schedule().into_iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_schedule() {
        let schedule: Vec<u64> = RetryPolicy::default()
            .schedule()
            .iter()
            .map(|d| d.as_millis() as u64)
            .collect();
        assert_eq!(schedule, vec![100, 200, 400, 800, 1600, 3200, 4000]);
    }

    #[test]
    fn test_worst_case_wait() {
        assert_eq!(
            RetryPolicy::default().worst_case_wait(),
            Duration::from_millis(10_300)
        );
    }

    #[test]
    fn test_delay_capped_beyond_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(7), Duration::from_secs(4));
        assert_eq!(policy.delay_for(63), Duration::from_secs(4));
        assert_eq!(policy.delay_for(200), Duration::from_secs(4));
    }

    #[test]
    fn test_new_from_durations() {
        let policy = RetryPolicy::new(3, Duration::from_millis(10), Duration::from_millis(15));
        let schedule = policy.schedule();
        assert_eq!(
            schedule,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(15),
                Duration::from_millis(15)
            ]
        );
    }
}
