//! Infrastructure layer.
//!
//! Technical concerns that support the application without containing
//! business logic.
//!
//! # Submodules
//!
//! - [`config`] - Configuration loading and validation
//! - [`live`] - Live stats channel runtime
//! - [`session`] - Persisted login session

pub mod config;
pub mod live;
pub mod session;
