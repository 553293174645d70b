//! Backoff, jitter and header randomization helpers

use rand::Rng;
use rand::seq::SliceRandom;
use std::time::Duration;

/// Exponential backoff schedule
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    initial: Duration,
    multiplier: f64,
}

impl Backoff {
    /// Create a schedule starting at `initial` and growing by `multiplier`
    pub fn new(initial: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            multiplier: multiplier.max(1.0),
        }
    }

    /// Schedule that doubles each time
    pub fn doubling(initial: Duration) -> Self {
        Self::new(initial, 2.0)
    }

    /// Delay after the given failed attempt (1-based)
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16) as i32;
        let millis = self.initial.as_millis() as f64 * self.multiplier.powi(exponent);
        Duration::from_millis(millis.round() as u64)
    }
}

/// Random delay within `[min_ms, max_ms]`
pub fn jitter(min_ms: u64, max_ms: u64) -> Duration {
    if max_ms <= min_ms {
        return Duration::from_millis(min_ms);
    }
    Duration::from_millis(rand::thread_rng().gen_range(min_ms..=max_ms))
}

/// Random entry of the user-agent pool
pub fn pick_user_agent(pool: &[String]) -> Option<&str> {
    pool.choose(&mut rand::thread_rng()).map(String::as_str)
}

/// Whether a response status should be retried
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_exponentially() {
        let backoff = Backoff::doubling(Duration::from_millis(100));
        assert_eq!(backoff.delay_after(1), Duration::from_millis(100));
        assert_eq!(backoff.delay_after(2), Duration::from_millis(200));
        assert_eq!(backoff.delay_after(3), Duration::from_millis(400));
    }

    #[test]
    fn test_backoff_never_shrinks() {
        let backoff = Backoff::new(Duration::from_millis(50), 0.1);
        assert_eq!(backoff.delay_after(4), Duration::from_millis(50));
    }

    #[test]
    fn test_jitter_stays_in_range() {
        for _ in 0..100 {
            let delay = jitter(10, 20);
            assert!(delay >= Duration::from_millis(10));
            assert!(delay <= Duration::from_millis(20));
        }
        assert_eq!(jitter(0, 0), Duration::ZERO);
    }

    #[test]
    fn test_user_agent_comes_from_pool() {
        let pool = vec!["agent-a".to_string(), "agent-b".to_string()];
        for _ in 0..20 {
            let picked = pick_user_agent(&pool).unwrap();
            assert!(pool.iter().any(|ua| ua == picked));
        }
        assert!(pick_user_agent(&[]).is_none());
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
    }
}
