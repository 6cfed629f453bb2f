//! Retry delays for denied requests

use banker_config::BackoffConfig;
use rand::Rng;
use std::time::Duration;

/// Exponential backoff with jitter, capped at `max_delay`
#[derive(Debug, Clone, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub multiplier: f64,
    /// Jitter factor (0.0 to 1.0)
    pub jitter_factor: f64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self::from(&BackoffConfig::default())
    }
}

impl From<&BackoffConfig> for BackoffPolicy {
    fn from(config: &BackoffConfig) -> Self {
        Self {
            initial_delay: Duration::from_millis(config.initial_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            multiplier: config.multiplier,
            jitter_factor: config.jitter_factor,
        }
    }
}

impl BackoffPolicy {
    /// Delay before retry number `attempt` (1-based), jittered with the
    /// thread-local generator.
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        self.delay_with(attempt, &mut rand::rng())
    }

    /// Same as [`BackoffPolicy::delay`], drawing jitter from `rng` so seeded
    /// runs stay reproducible.
    #[must_use]
    pub fn delay_with<R: Rng + ?Sized>(&self, attempt: u32, rng: &mut R) -> Duration {
        // Precision loss acceptable for backoff calculations
        #[allow(clippy::cast_precision_loss)]
        let (base_delay, max_delay) = (
            self.initial_delay.as_millis().min(u128::from(u64::MAX)) as f64,
            self.max_delay.as_millis().min(u128::from(u64::MAX)) as f64,
        );

        let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay = (base_delay * self.multiplier.powi(exponent)).min(max_delay);

        let jitter = delay * self.jitter_factor * (rng.random::<f64>() - 0.5);

        // Jitter may push past either bound
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let final_delay = (delay + jitter).clamp(0.0, max_delay).round() as u64;

        Duration::from_millis(final_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn without_jitter() -> BackoffPolicy {
        BackoffPolicy {
            jitter_factor: 0.0,
            ..BackoffPolicy::default()
        }
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = without_jitter();
        assert_eq!(policy.delay(1), Duration::from_millis(500));
        assert_eq!(policy.delay(2), Duration::from_millis(1000));
        assert_eq!(policy.delay(3), Duration::from_millis(2000));
    }

    #[test]
    fn test_delay_is_capped() {
        let policy = without_jitter();
        assert_eq!(policy.delay(10), Duration::from_millis(5000));
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(5000));
    }

    #[test]
    fn test_attempt_zero_uses_initial_delay() {
        assert_eq!(without_jitter().delay(0), Duration::from_millis(500));
    }

    #[test]
    fn test_jitter_stays_within_bounds() {
        let policy = BackoffPolicy {
            jitter_factor: 1.0,
            ..BackoffPolicy::default()
        };
        let mut rng = StdRng::seed_from_u64(3);
        for attempt in 1..12 {
            let delay = policy.delay_with(attempt, &mut rng);
            assert!(delay <= policy.max_delay, "{delay:?} above cap");
        }

        let first = policy.delay_with(2, &mut rng);
        assert!(first >= Duration::from_millis(500));
        assert!(first <= Duration::from_millis(1500));
    }

    #[test]
    fn test_seeded_jitter_is_reproducible() {
        let policy = BackoffPolicy::default();
        let a = policy.delay_with(2, &mut StdRng::seed_from_u64(11));
        let b = policy.delay_with(2, &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
