//! Persisted login session.
//!
//! The bearer token produced by `login` is kept in a small JSON file so
//! later commands can reuse it. `COOPDASH_TOKEN` overrides the file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::domain::Session;
use crate::error::{Error, Result};
use crate::infrastructure::config::session::SessionConfig;

/// Environment variable that supplies a token directly.
pub const TOKEN_ENV: &str = "COOPDASH_TOKEN";

/// File-backed session storage.
#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured path, or `<config dir>/coopdash/session.json`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Session`] when no path is configured and the
    /// platform has no config directory.
    pub fn from_config(config: &SessionConfig) -> Result<Self> {
        if let Some(path) = &config.path {
            return Ok(Self::new(path));
        }
        let base = dirs::config_dir()
            .ok_or_else(|| Error::Session("no platform config directory".into()))?;
        Ok(Self::new(base.join("coopdash").join("session.json")))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Session from the environment, falling back to the stored file.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored file exists but cannot be read.
    pub fn resolve(&self) -> Result<Option<Session>> {
        match std::env::var(TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => {
                debug!(var = TOKEN_ENV, "Using token from environment");
                Ok(Some(Session::from_token(token.trim())))
            }
            _ => self.load(),
        }
    }

    /// Read the stored session. A missing file means logged out.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a session.
    pub fn load(&self) -> Result<Option<Session>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let session = serde_json::from_str(&content).map_err(|e| {
            Error::Session(format!("corrupt session file {}: {e}", self.path.display()))
        })?;
        Ok(Some(session))
    }

    /// Persist `session`, readable only by the current user.
    ///
    /// # Errors
    ///
    /// Returns an error if the file or its directory cannot be written.
    pub fn save(&self, session: &Session) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_vec_pretty(session)?)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        debug!(path = %self.path.display(), "Session saved");
        Ok(())
    }

    /// Remove the stored session. Returns whether one existed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be removed.
    pub fn clear(&self) -> Result<bool> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
