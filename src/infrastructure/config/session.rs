//! Session storage configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Where the login session is persisted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    /// Override for the session file. Defaults to the platform config dir.
    #[serde(default)]
    pub path: Option<PathBuf>,
}
