//! Reconnect backoff.

use std::time::Duration;

use serde::Deserialize;

/// Exponential backoff with a bounded number of consecutive attempts.
///
/// ```toml
/// [discovery.backoff]
/// initial_ms = 250
/// max_ms = 30000
/// max_attempts = 10
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Backoff {
    /// Delay before the first reconnect.
    pub initial_ms: u64,
    /// Upper bound for a single delay.
    pub max_ms: u64,
    /// Consecutive failed attempts tolerated before the subscription fails.
    pub max_attempts: u32,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_ms: 250,
            max_ms: 30_000,
            max_attempts: 10,
        }
    }
}

impl Backoff {
    /// Delay before reconnect attempt `attempt` (1-based): `initial * 2^(attempt-1)`,
    /// capped at `max_ms`.
    pub fn delay(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(63);
        let ms = self
            .initial_ms
            .checked_mul(1u64 << shift)
            .unwrap_or(u64::MAX)
            .min(self.max_ms);
        Duration::from_millis(ms)
    }

    /// Whether another attempt is allowed after `attempt` failures.
    pub fn allows(&self, attempt: u32) -> bool {
        attempt <= self.max_attempts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_doubles_until_cap() {
        let backoff = Backoff {
            initial_ms: 100,
            max_ms: 1_000,
            max_attempts: 5,
        };
        assert_eq!(backoff.delay(1), Duration::from_millis(100));
        assert_eq!(backoff.delay(2), Duration::from_millis(200));
        assert_eq!(backoff.delay(4), Duration::from_millis(800));
        assert_eq!(backoff.delay(5), Duration::from_millis(1_000));
        assert_eq!(backoff.delay(200), Duration::from_millis(1_000));
    }

    #[test]
    fn test_allows_is_bounded() {
        let backoff = Backoff {
            max_attempts: 2,
            ..Backoff::default()
        };
        assert!(backoff.allows(1));
        assert!(backoff.allows(2));
        assert!(!backoff.allows(3));
    }
}
