//! Stats feed reconnection configuration.

use serde::Deserialize;

/// WebSocket reconnection configuration.
///
/// The delay before retry `k` is `min(max_delay_ms, initial_delay_ms *
/// backoff_multiplier^k)`. Retries continue indefinitely.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReconnectionConfig {
    /// Base delay (milliseconds).
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Maximum delay between reconnection attempts (milliseconds).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    /// Multiplier applied per attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

const fn default_initial_delay_ms() -> u64 {
    1000 // 1 second
}

const fn default_max_delay_ms() -> u64 {
    30000 // 30 seconds
}

const fn default_backoff_multiplier() -> f64 {
    2.0
}

impl Default for ReconnectionConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}
