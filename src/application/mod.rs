//! Application layer: transport-independent behavior.

pub mod stats;
