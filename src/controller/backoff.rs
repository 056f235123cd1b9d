//! # Exponential Backoff
//!
//! Per-resource retry delays for transient reconcile errors: the delay
//! doubles on every consecutive failure, starting at `min` and capped at
//! `max`.

use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExponentialBackoff {
    min: Duration,
    max: Duration,
    attempts: u32,
}

impl ExponentialBackoff {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max: max.max(min),
            attempts: 0,
        }
    }

    /// Delay before the next retry; advances the attempt counter
    pub fn next_backoff(&mut self) -> Duration {
        let delay = Self::delay_for(self.attempts, self.min, self.max);
        self.attempts = self.attempts.saturating_add(1);
        delay
    }

    /// Consecutive failures recorded so far
    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Delay for the given number of previous failures
    #[must_use]
    pub fn delay_for(attempts: u32, min: Duration, max: Duration) -> Duration {
        let factor = 2u32.checked_pow(attempts).unwrap_or(u32::MAX);
        min.checked_mul(factor).unwrap_or(max).min(max)
    }
}

/// Backoff state per resource key
#[derive(Debug)]
pub struct BackoffRegistry {
    min: Duration,
    max: Duration,
    states: Mutex<HashMap<String, ExponentialBackoff>>,
}

impl BackoffRegistry {
    #[must_use]
    pub fn new(min: Duration, max: Duration) -> Self {
        Self {
            min,
            max,
            states: Mutex::new(HashMap::new()),
        }
    }

    /// Delay before retrying `key`, and the number of consecutive failures
    pub fn next_backoff(&self, key: &str) -> (Duration, u32) {
        let mut states = self.states.lock().unwrap_or_else(PoisonError::into_inner);
        let state = states
            .entry(key.to_string())
            .or_insert_with(|| ExponentialBackoff::new(self.min, self.max));
        let delay = state.next_backoff();
        (delay, state.attempts())
    }

    /// Forget the failure history of `key`
    pub fn reset(&self, key: &str) {
        self.states
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_tracks_keys_independently() {
        let registry = BackoffRegistry::new(Duration::from_secs(5), Duration::from_secs(300));
        assert_eq!(registry.next_backoff("a"), (Duration::from_secs(5), 1));
        assert_eq!(registry.next_backoff("a"), (Duration::from_secs(10), 2));
        assert_eq!(registry.next_backoff("b"), (Duration::from_secs(5), 1));
        registry.reset("a");
        assert_eq!(registry.next_backoff("a"), (Duration::from_secs(5), 1));
    }

    #[test]
    fn test_doubles_until_capped() {
        let mut backoff = ExponentialBackoff::new(Duration::from_secs(5), Duration::from_secs(60));
        let delays: Vec<u64> = (0..6).map(|_| backoff.next_backoff().as_secs()).collect();
        assert_eq!(delays, [5, 10, 20, 40, 60, 60]);
        assert_eq!(backoff.attempts(), 6);
    }

    #[test]
    fn test_reset() {
        let mut backoff = ExponentialBackoff::new(Duration::from_secs(5), Duration::from_secs(300));
        backoff.next_backoff();
        backoff.next_backoff();
        backoff.reset();
        assert_eq!(backoff.next_backoff(), Duration::from_secs(5));
    }

    #[test]
    fn test_huge_attempt_count_does_not_overflow() {
        let delay = ExponentialBackoff::delay_for(200, Duration::from_secs(5), Duration::from_secs(300));
        assert_eq!(delay, Duration::from_secs(300));
    }

    #[test]
    fn test_max_below_min_is_raised() {
        let mut backoff = ExponentialBackoff::new(Duration::from_secs(10), Duration::from_secs(1));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
        assert_eq!(backoff.next_backoff(), Duration::from_secs(10));
    }
}
