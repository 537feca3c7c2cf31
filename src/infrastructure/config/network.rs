//! Endpoint configuration.

use serde::Deserialize;

/// Remote endpoints of the cooperative backend.
#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    /// Streaming endpoint for live aggregate statistics.
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    /// Base URL of the REST API.
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Timeout for each REST request (seconds).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_ws_url() -> String {
    "wss://saving-api.mababa.app/ws/stats".into()
}

fn default_api_url() -> String {
    "https://saving-api.mababa.app".into()
}

const fn default_request_timeout_secs() -> u64 {
    15
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            api_url: default_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}
