//! Adapters connecting the core to the outside world.
//!
//! - [`inbound`] - the command-line interface (presentation layer)
//! - [`outbound`] - WebSocket stats feed and REST API client

pub mod inbound;
pub mod outbound;
