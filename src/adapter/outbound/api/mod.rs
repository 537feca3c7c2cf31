//! Cooperative REST API adapter.

mod client;

pub use client::{ApiMessage, CoopApiClient};
