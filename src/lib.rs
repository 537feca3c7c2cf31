//! Coopdash - administration client for a savings and loan cooperative.
//!
//! The centrepiece is the live statistics channel: a receive-only
//! WebSocket feed of aggregate snapshots that are shallow-merged into one
//! view, with capped exponential backoff reconnection and safe teardown.
//!
//! # Architecture
//!
//! - [`domain`] - Snapshot parsing and merging, records, formatting
//! - [`application`] - The IO-free channel state machine and backoff policy
//! - [`port`] - The [`StatsFeed`](port::outbound::feed::StatsFeed) transport seam
//! - [`adapter`] - WebSocket feed, REST client and the CLI
//! - [`infrastructure`] - Channel runtime, configuration, session storage
//!
//! # Example
//!
//! ```no_run
//! use coopdash::infrastructure::config::Config;
//! use coopdash::infrastructure::live::LiveStatsChannel;
//!
//! # async fn demo() {
//! let config = Config::default();
//! let mut subscription = LiveStatsChannel::from_config(&config).activate();
//! if let Some(view) = subscription.changed().await {
//!     println!("loading: {}", view.is_loading);
//! }
//! subscription.deactivate().await;
//! # }
//! ```

pub mod adapter;
pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod port;

#[cfg(any(test, feature = "testkit"))]
pub mod testkit;
