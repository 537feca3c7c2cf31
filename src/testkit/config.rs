//! Canonical test configurations.
//!
//! Single source of truth for config values used across tests.

use crate::application::stats::Backoff;
use crate::infrastructure::config::reconnection::ReconnectionConfig;

/// Short reconnection delays: 10ms, 20ms, then capped at 40ms.
pub fn reconnection() -> ReconnectionConfig {
    ReconnectionConfig {
        initial_delay_ms: 10,
        max_delay_ms: 40,
        backoff_multiplier: 2.0,
    }
}

/// [`Backoff`] built from [`reconnection`].
pub fn backoff() -> Backoff {
    Backoff::from(&reconnection())
}

/// Minimal config file pointing both endpoints at `host`.
pub fn config_toml(host: &str) -> String {
    format!(
        r#"[network]
ws_url = "ws://{host}/ws/stats"
api_url = "http://{host}"
request_timeout_secs = 2

[logging]
level = "warn"
format = "pretty"

[reconnection]
initial_delay_ms = 10
max_delay_ms = 40
backoff_multiplier = 2.0
"#
    )
}
