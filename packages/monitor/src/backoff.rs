//! Recovery delays and randomized cooldowns.

use std::time::Duration;

/// Exponential backoff with a ceiling.
///
/// `delay = min(max_delay, min_delay * 2^attempt)` plus a uniform jitter of
/// up to 10% of the delay (jitter itself capped at 30 s), so repeated
/// failures degrade gracefully to a ceiling instead of growing unbounded.
#[derive(Debug, Clone)]
pub struct BackoffPolicy {
    pub min_delay: Duration,
    pub max_delay: Duration,

    /// Attempt counter cap; beyond it the delay no longer grows.
    pub max_attempt: u32,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            min_delay: Duration::from_secs(180),
            max_delay: Duration::from_secs(900),
            max_attempt: 6,
        }
    }
}

impl BackoffPolicy {
    pub fn new(min_delay: Duration, max_delay: Duration) -> Self {
        Self {
            min_delay,
            max_delay,
            ..Self::default()
        }
    }

    /// Deterministic delay for an attempt, before jitter.
    pub fn base_delay(&self, attempt: u32) -> Duration {
        let attempt = attempt.min(self.max_attempt);
        let factor = 2u32.saturating_pow(attempt);
        self.min_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Jittered delay for an attempt.
    pub fn delay(&self, attempt: u32) -> Duration {
        let base = self.base_delay(attempt);
        let jitter_cap = (base.as_secs_f64() * 0.1).min(30.0);
        base + Duration::from_secs_f64(fastrand::f64() * jitter_cap)
    }

    /// Attempt counter after one more failure, clamped at the cap.
    pub fn next_attempt(&self, attempt: u32) -> u32 {
        attempt.saturating_add(1).min(self.max_attempt)
    }
}

/// Success-path sleep: fixed base plus uniform jitter.
pub fn human_interval(base: Duration, jitter: Duration) -> Duration {
    base + Duration::from_secs_f64(fastrand::f64() * jitter.as_secs_f64())
}

/// Uniform draw between two bounds, for randomized cooldowns.
pub fn cooldown_between(min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    min + Duration::from_secs_f64(fastrand::f64() * (max - min).as_secs_f64())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_delay_doubles_until_ceiling() {
        let policy = BackoffPolicy::default();

        assert_eq!(policy.base_delay(0), Duration::from_secs(180));
        assert_eq!(policy.base_delay(1), Duration::from_secs(360));
        assert_eq!(policy.base_delay(2), Duration::from_secs(720));
        assert_eq!(policy.base_delay(3), Duration::from_secs(900));
        assert_eq!(policy.base_delay(100), Duration::from_secs(900));
    }

    #[test]
    fn base_delay_is_monotonic_and_capped() {
        let policy = BackoffPolicy::new(Duration::from_secs(1), Duration::from_secs(60));

        let mut previous = Duration::ZERO;
        for attempt in 0..32 {
            let delay = policy.base_delay(attempt);
            assert!(delay >= previous);
            assert!(delay <= policy.max_delay);
            previous = delay;
        }
    }

    #[test]
    fn jitter_stays_within_ten_percent() {
        let policy = BackoffPolicy::default();
        for attempt in 0..8 {
            let base = policy.base_delay(attempt);
            let delay = policy.delay(attempt);
            assert!(delay >= base);
            assert!(delay <= base + Duration::from_secs(30));
        }
    }

    #[test]
    fn attempt_counter_is_clamped() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.next_attempt(0), 1);
        assert_eq!(policy.next_attempt(6), 6);
        assert_eq!(policy.next_attempt(u32::MAX), 6);
    }

    #[test]
    fn human_interval_bounds() {
        let base = Duration::from_secs(10);
        let jitter = Duration::from_secs(5);
        for _ in 0..32 {
            let slept = human_interval(base, jitter);
            assert!(slept >= base);
            assert!(slept <= base + jitter);
        }
    }

    #[test]
    fn cooldown_between_bounds() {
        let min = Duration::from_secs(15);
        let max = Duration::from_secs(45);
        for _ in 0..32 {
            let cooldown = cooldown_between(min, max);
            assert!(cooldown >= min);
            assert!(cooldown <= max);
        }
        assert_eq!(cooldown_between(max, min), max);
    }
}
