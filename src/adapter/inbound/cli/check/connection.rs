use std::time::Duration;

use crate::adapter::inbound::cli::output;
use crate::adapter::inbound::cli::session::api_client;
use crate::adapter::outbound::websocket::WebSocketStatsFeed;
use crate::error::{Error, Result};
use crate::infrastructure::config::Config;
use crate::port::outbound::feed::StatsFeed;

/// Probe the REST API and open one stats WebSocket connection.
pub async fn execute_connection(config: &Config) -> Result<()> {
    output::section("Connection Check");
    output::field("WebSocket", &config.network.ws_url);
    output::field("API", &config.network.api_url);

    let pb = output::spinner("Checking REST API...");
    match api_client(config)?.probe().await {
        Ok(status) => {
            output::spinner_success(&pb, &format!("REST API reachable (HTTP {status})"));
        }
        Err(e) => {
            output::spinner_fail(&pb, "REST API unreachable");
            return Err(e);
        }
    }

    let pb = output::spinner("Checking WebSocket...");
    let mut feed = WebSocketStatsFeed::new(config.network.ws_url.clone());
    let timeout = Duration::from_secs(config.network.request_timeout_secs);
    match tokio::time::timeout(timeout, feed.connect()).await {
        Ok(Ok(())) => {
            let _ = feed.close().await;
            output::spinner_success(&pb, "WebSocket connected");
        }
        Ok(Err(e)) => {
            output::spinner_fail(&pb, "WebSocket connection failed");
            return Err(e);
        }
        Err(_) => {
            output::spinner_fail(&pb, "WebSocket connection timed out");
            return Err(Error::Connection(format!(
                "no WebSocket handshake within {}s",
                timeout.as_secs()
            )));
        }
    }

    output::success("Connection checks passed");
    Ok(())
}
