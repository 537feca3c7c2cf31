//! Trait definitions (hexagonal ports). Depend only on domain.
//!
//! Ports define the extension points in the hexagonal architecture.
//! They are traits that adapters implement to integrate with external
//! systems.
//!
//! # Available Ports
//!
//! - [`outbound::feed::StatsFeed`] - Streaming connection carrying stats snapshots

pub mod outbound;
