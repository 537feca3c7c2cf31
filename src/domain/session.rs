//! Authenticated administrator session.

use serde::{Deserialize, Serialize};

/// Login request body.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Bearer token and the profile returned by a successful login.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub user_info: serde_json::Value,
}

impl Session {
    /// Session built from a bare token, with no profile.
    #[must_use]
    pub fn from_token(token: impl Into<String>) -> Self {
        Self {
            access_token: token.into(),
            user_info: serde_json::Value::Null,
        }
    }

    /// Best-effort display name from the login profile.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        ["username", "email", "name"]
            .into_iter()
            .find_map(|key| self.user_info.get(key).and_then(serde_json::Value::as_str))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("user_info", &self.user_info)
            .finish()
    }
}
