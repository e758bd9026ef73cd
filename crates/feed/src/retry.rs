//! Bounded retry parameters for feed fetches.
//!
//! Every attempt has its own timeout. Between attempts the orchestrator
//! sleeps for an exponentially growing delay, clamped to `max_delay`.

use std::time::Duration;

/// Retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 2;
/// Upper bound on a single attempt.
pub const DEFAULT_ATTEMPT_TIMEOUT: Duration = Duration::from_secs(20);

/// Tunable parameters for the fetch retry loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt (total attempts = `max_retries + 1`).
    pub max_retries: u32,
    /// Timeout applied to each attempt independently.
    pub attempt_timeout: Duration,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on the delay between attempts.
    pub max_delay: Duration,
    /// Factor by which the delay grows after each failure.
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            attempt_timeout: DEFAULT_ATTEMPT_TIMEOUT,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
            multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Policy with no delay between attempts.
    pub fn immediate(max_retries: u32, attempt_timeout: Duration) -> Self {
        Self {
            max_retries,
            attempt_timeout,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            multiplier: 1.0,
        }
    }

    pub fn total_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

/// Calculate the next backoff delay from the current delay and policy.
///
/// The result is clamped to [`RetryPolicy::max_delay`].
pub fn next_delay(current: Duration, policy: &RetryPolicy) -> Duration {
    let next_ms = (current.as_millis() as f64 * policy.multiplier) as u64;
    Duration::from_millis(next_ms).min(policy.max_delay)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budget() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.total_attempts(), 3);
        assert_eq!(policy.attempt_timeout, Duration::from_secs(20));
    }

    #[test]
    fn next_delay_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(next_delay(Duration::from_millis(500), &policy), Duration::from_secs(1));
    }

    #[test]
    fn next_delay_clamps_at_max() {
        let policy = RetryPolicy::default();
        assert_eq!(next_delay(Duration::from_secs(4), &policy), Duration::from_secs(5));
    }

    #[test]
    fn immediate_policy_never_waits() {
        let policy = RetryPolicy::immediate(2, Duration::from_secs(1));
        assert_eq!(next_delay(policy.initial_delay, &policy), Duration::ZERO);
    }
}
