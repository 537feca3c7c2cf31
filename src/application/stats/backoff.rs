//! Capped exponential backoff for reconnection attempts.

use std::time::Duration;

use crate::infrastructure::config::reconnection::ReconnectionConfig;

/// Delay policy: `min(max, initial * multiplier^attempt)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Backoff {
    initial_ms: u64,
    max_ms: u64,
    multiplier: f64,
}

impl Backoff {
    #[must_use]
    pub const fn new(initial_ms: u64, max_ms: u64, multiplier: f64) -> Self {
        Self {
            initial_ms,
            max_ms,
            multiplier,
        }
    }

    /// Delay before reconnection attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let scaled = self.initial_ms as f64 * self.multiplier.powi(exponent);
        let capped = if scaled.is_finite() {
            scaled.min(self.max_ms as f64)
        } else {
            self.max_ms as f64
        };
        Duration::from_millis(capped as u64)
    }

    #[must_use]
    pub const fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(1_000, 30_000, 2.0)
    }
}

impl From<&ReconnectionConfig> for Backoff {
    fn from(config: &ReconnectionConfig) -> Self {
        Self::new(
            config.initial_delay_ms,
            config.max_delay_ms,
            config.backoff_multiplier,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_delays_double_from_two_seconds() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(1), Duration::from_millis(2_000));
        assert_eq!(backoff.delay(2), Duration::from_millis(4_000));
        assert_eq!(backoff.delay(3), Duration::from_millis(8_000));
        assert_eq!(backoff.delay(4), Duration::from_millis(16_000));
    }

    #[test]
    fn delay_is_capped() {
        let backoff = Backoff::default();
        assert_eq!(backoff.delay(5), Duration::from_millis(30_000));
        assert_eq!(backoff.delay(60), Duration::from_millis(30_000));
        assert_eq!(backoff.delay(u32::MAX), backoff.max_delay());
    }

    #[test]
    fn follows_configured_values() {
        let config = ReconnectionConfig {
            initial_delay_ms: 10,
            max_delay_ms: 100,
            backoff_multiplier: 3.0,
        };
        let backoff = Backoff::from(&config);
        assert_eq!(backoff.delay(1), Duration::from_millis(30));
        assert_eq!(backoff.delay(2), Duration::from_millis(90));
        assert_eq!(backoff.delay(3), Duration::from_millis(100));
    }
}
