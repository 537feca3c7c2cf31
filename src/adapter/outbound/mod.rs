//! Outbound adapters: implementations of the driven side.

pub mod api;
pub mod websocket;
