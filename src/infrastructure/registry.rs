//! Registry credentials
//!
//! The engine expects push credentials as base64 (URL-safe alphabet) of a
//! JSON object `{"username": .., "password": ..}` in the `X-Registry-Auth`
//! header.

use base64::Engine;
use serde::Serialize;

use crate::error::PushError;

/// Registry credentials for authentication
#[derive(Clone, Serialize)]
pub struct RegistryCredentials {
    pub username: String,
    pub password: String,
}

impl std::fmt::Debug for RegistryCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryCredentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl RegistryCredentials {
    /// Create credentials from username and token
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Build credentials from the externally supplied token
    ///
    /// The username is fixed by configuration; a missing or blank token is an error.
    pub fn from_token(
        username: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, PushError> {
        let token = token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or(PushError::MissingCredentials)?;
        Ok(Self::new(username, token))
    }

    /// Opaque token for the engine's registry auth header
    pub fn encode(&self) -> Result<String, PushError> {
        let json = serde_json::to_vec(self)?;
        Ok(base64::engine::general_purpose::URL_SAFE.encode(json))
    }
}
