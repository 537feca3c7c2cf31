//! Live statistics feed: reconnect policy and channel state machine.

pub mod backoff;
pub mod channel;

pub use backoff::Backoff;
pub use channel::{ChannelCommand, ConnectionState, RetryToken, StatsChannel, StatsView};
