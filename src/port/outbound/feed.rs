//! Stats feed port.
//!
//! The transport seam of the live stats channel. Implementations own one
//! reusable connection: `connect` may be called again after a disconnect
//! to open a fresh one.

use async_trait::async_trait;

use crate::error::Error;

/// Inbound event from a stats feed connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// One text message, not yet parsed.
    Payload(String),
    /// The connection closed or failed.
    Disconnected { reason: String },
}

/// Persistent, receive-only streaming connection.
#[async_trait]
pub trait StatsFeed: Send {
    /// Open a connection to the streaming endpoint.
    async fn connect(&mut self) -> Result<(), Error>;

    /// Receive the next event.
    ///
    /// Blocks until a message arrives or the connection closes. Returns
    /// `None` when there is no open connection or the stream has ended.
    async fn next_event(&mut self) -> Option<FeedEvent>;

    /// Close the current connection, if any.
    async fn close(&mut self) -> Result<(), Error>;

    /// Endpoint description for logging.
    fn endpoint(&self) -> &str;
}

/// Implement StatsFeed for boxed trait objects to allow use with generic wrappers.
#[async_trait]
impl StatsFeed for Box<dyn StatsFeed> {
    async fn connect(&mut self) -> Result<(), Error> {
        (**self).connect().await
    }

    async fn next_event(&mut self) -> Option<FeedEvent> {
        (**self).next_event().await
    }

    async fn close(&mut self) -> Result<(), Error> {
        (**self).close().await
    }

    fn endpoint(&self) -> &str {
        (**self).endpoint()
    }
}
