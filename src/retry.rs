//! Retry accounting and backoff policy for non-blocking reads.
//!
//! Non-blocking primitives signal both "no data yet" and "would block" as
//! expected, frequent conditions. Both are retried rather than surfaced,
//! but both carry a hard ceiling so a permanently silent peer does not
//! turn into an unbounded spin. Would-block retries additionally back off
//! exponentially, capped at [`DEFAULT_MAX_DELAY`].

use std::time::Duration;

/// Default maximum consecutive empty/blocked attempts before the session
/// is dropped.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry.
pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_millis(100);

/// Default cap on a backoff delay.
pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(1);

/// Backoff configuration for one reader.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Consecutive failed attempts tolerated before disconnecting.
    pub max_retries: u32,
    /// Delay before the first retry; doubles on each further would-block.
    pub initial_delay: Duration,
    /// Upper bound applied to the doubled delay.
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay: DEFAULT_INITIAL_DELAY,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Backoff delay before the `attempt`-th consecutive retry (1-indexed).
    ///
    /// `min(initial * 2^(attempt - 1), max)`: with the defaults the
    /// sequence is 100ms, 200ms, 400ms, 800ms, 1s, 1s, ...
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        let delay = self.initial_delay.saturating_mul(1u32 << exp);
        delay.min(self.max_delay)
    }
}

/// Counter of consecutive empty/blocked read attempts.
///
/// Scoped to one logical "wait for more data" episode: any successful
/// non-empty read resets it, and it is never carried across reconnects.
#[derive(Debug, Default)]
pub struct RetryState {
    attempts: u32,
}

impl RetryState {
    /// Create a fresh counter.
    pub fn new() -> Self {
        Self { attempts: 0 }
    }

    /// Consecutive failed attempts recorded so far.
    #[inline]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Clear the counter after a successful non-empty read.
    #[inline]
    pub fn reset(&mut self) {
        self.attempts = 0;
    }

    /// Record one more failed attempt.
    ///
    /// Returns `true` once the configured maximum is reached, at which
    /// point the caller must stop retrying and drop the session.
    pub fn record_attempt(&mut self, policy: &RetryPolicy) -> bool {
        self.attempts += 1;
        self.attempts >= policy.max_retries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_reached_on_third_attempt() {
        let policy = RetryPolicy::default();
        let mut retry = RetryState::new();

        assert!(!retry.record_attempt(&policy));
        assert!(!retry.record_attempt(&policy));
        assert!(retry.record_attempt(&policy));
        assert_eq!(retry.attempts(), 3);
    }

    #[test]
    fn test_reset_restarts_the_episode() {
        let policy = RetryPolicy::default();
        let mut retry = RetryState::new();

        retry.record_attempt(&policy);
        retry.record_attempt(&policy);
        retry.reset();
        assert_eq!(retry.attempts(), 0);
        assert!(!retry.record_attempt(&policy));
    }

    #[test]
    fn test_backoff_sequence_doubles_then_caps() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(3), Duration::from_millis(400));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for(5), Duration::from_secs(1));
        assert_eq!(policy.delay_for(6), Duration::from_secs(1));
    }

    #[test]
    fn test_backoff_sequence_is_non_decreasing() {
        let policy = RetryPolicy::default();
        let mut previous = Duration::ZERO;
        for attempt in 1..=32 {
            let delay = policy.delay_for(attempt);
            assert!(delay >= previous, "delay shrank at attempt {attempt}");
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }
}
