//! Infrastructure configuration modules.

pub mod logging;
pub mod network;
pub mod reconnection;
pub mod session;
pub mod settings;

pub use settings::Config;
