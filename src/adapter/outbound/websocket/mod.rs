//! WebSocket transport for the live stats feed.

mod stream;

pub use stream::WebSocketStatsFeed;
