//! WebSocket stats feed.
//!
//! Implements [`StatsFeed`] over `tokio-tungstenite`. The client never sends
//! application messages; it only answers pings and forwards text frames.
//!
//! # Frame Handling
//!
//! - **Text**: forwarded as [`FeedEvent::Payload`] without parsing
//! - **Ping**: answered with a pong carrying the same payload
//! - **Close**: reported as [`FeedEvent::Disconnected`] with the close reason
//! - **Binary / Pong**: ignored
//! - **Errors**: reported as [`FeedEvent::Disconnected`]

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, info, trace, warn};
use url::Url;

use crate::error::Result;
use crate::port::outbound::feed::{FeedEvent, StatsFeed};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Stats feed over a single WebSocket connection.
pub struct WebSocketStatsFeed {
    url: String,
    ws: Option<Socket>,
}

impl WebSocketStatsFeed {
    /// Create a disconnected feed for the given WebSocket URL.
    #[must_use]
    pub const fn new(url: String) -> Self {
        Self { url, ws: None }
    }

    /// Whether a connection is currently held.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.ws.is_some()
    }

    fn disconnected(&mut self, reason: impl Into<String>) -> Option<FeedEvent> {
        self.ws = None;
        Some(FeedEvent::Disconnected {
            reason: reason.into(),
        })
    }
}

#[async_trait]
impl StatsFeed for WebSocketStatsFeed {
    async fn connect(&mut self) -> Result<()> {
        // A previous socket is dropped, never reused.
        self.ws = None;
        let url = Url::parse(&self.url)?;
        info!(url = %url, "Connecting to stats WebSocket");
        let (ws_stream, response) = connect_async(url.as_str()).await?;
        info!(status = %response.status(), "Stats WebSocket connected");
        self.ws = Some(ws_stream);
        Ok(())
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        loop {
            let ws = self.ws.as_mut()?;
            let Some(frame) = ws.next().await else {
                return self.disconnected("stream ended");
            };
            match frame {
                Ok(Message::Text(text)) => {
                    trace!(bytes = text.len(), "Received WebSocket text frame");
                    return Some(FeedEvent::Payload(text));
                }
                Ok(Message::Ping(data)) => {
                    trace!("Received WebSocket ping");
                    if let Err(e) = ws.send(Message::Pong(data)).await {
                        return self.disconnected(format!("failed to send pong: {e}"));
                    }
                }
                Ok(Message::Close(frame)) => {
                    info!(frame = ?frame, "Stats WebSocket closed by server");
                    let reason = frame
                        .map(|f| f.reason.to_string())
                        .filter(|r| !r.is_empty())
                        .unwrap_or_else(|| "closed by server".into());
                    return self.disconnected(reason);
                }
                Ok(_) => continue,
                Err(e) => {
                    warn!(error = %e, "Stats WebSocket error");
                    return self.disconnected(e.to_string());
                }
            }
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut ws) = self.ws.take() {
            debug!(url = %self.url, "Closing stats WebSocket");
            ws.close(None).await?;
        }
        Ok(())
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
