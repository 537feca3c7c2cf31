//! Shared test utilities available to both unit and integration tests.
//!
//! Enabled via `#[cfg(test)]` (unit tests) or the `testkit` feature
//! (integration tests).
//!
//! # Modules
//!
//! - [`stream`] - Mock [`StatsFeed`](crate::port::outbound::feed::StatsFeed)
//!   implementations: `ScriptedFeed`, `ChannelFeed`.
//! - [`config`] - Canonical test configurations.
//! - [`http`] - `MockApi`, an in-process REST server with request capture.

pub mod config;
pub mod http;
pub mod stream;
