mod auth;
mod server;

#[cfg(test)]
mod tests;

pub use auth::*;
pub use server::*;

use std::path::Path;

use serde::Deserialize;
use tracing::info;

use crate::error::ServerError;

/// Environment variable that overrides `auth.client_secret`.
pub const CLIENT_SECRET_ENV: &str = "RESTVOICE_CLIENT_SECRET";
/// Environment variable that overrides `auth.shared_secret`.
pub const SHARED_SECRET_ENV: &str = "RESTVOICE_SHARED_SECRET";

/// Top-level configuration for the Restvoice server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct RestvoiceConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity provider and token verification configuration.
    #[serde(default)]
    pub auth: AuthConfig,
}

impl RestvoiceConfig {
    /// Load configuration from `path`, or use defaults if the file does not
    /// exist.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        if !path.exists() {
            info!(path = %path.display(), "config file not found, using defaults");
            return toml::from_str("").map_err(|e| ServerError::Config(e.to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        toml::from_str(&contents)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))
    }

    /// Replace secrets with values from the environment, if set.
    ///
    /// `lookup` is usually `|k| std::env::var(k).ok()`.
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(secret) = lookup(CLIENT_SECRET_ENV) {
            self.auth.client_secret = Some(secret);
        }
        if let Some(secret) = lookup(SHARED_SECRET_ENV) {
            self.auth.shared_secret = Some(secret);
        }
    }
}
