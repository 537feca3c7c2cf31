use std::path::Path;

use crate::adapter::inbound::cli::output;
use crate::error::Result;
use crate::infrastructure::config::Config;
use crate::infrastructure::session::{SessionStore, TOKEN_ENV};

/// Validate the configuration and show the effective settings.
///
/// `config` has already been loaded; `source` is `None` when the built-in
/// defaults are in use.
pub fn execute_config(config: &Config, source: Option<&Path>) -> Result<()> {
    output::section("Configuration Check");
    match source {
        Some(path) => output::field("Config", path.display()),
        None => output::field("Config", "built-in defaults"),
    }
    output::success("Configuration is valid");

    output::section("Network");
    output::field("WebSocket", &config.network.ws_url);
    output::field("API", &config.network.api_url);
    output::field(
        "Request timeout",
        format!("{}s", config.network.request_timeout_secs),
    );

    output::section("Reconnection");
    let reconnection = &config.reconnection;
    output::field("Initial delay", format!("{}ms", reconnection.initial_delay_ms));
    output::field("Max delay", format!("{}ms", reconnection.max_delay_ms));
    output::field("Multiplier", reconnection.backoff_multiplier);

    output::section("Session");
    let store = SessionStore::from_config(&config.session)?;
    output::field("Path", store.path().display());
    if std::env::var_os(TOKEN_ENV).is_some() {
        output::field("Token", format!("from {TOKEN_ENV}"));
    } else if store.load()?.is_some() {
        output::field("Token", "stored");
    } else {
        output::warning("Not logged in (run `coopdash login`)");
    }

    Ok(())
}
