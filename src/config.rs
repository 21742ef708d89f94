//! Configuration loading.
//!
//! Reads an optional JSON config file and layers environment variable
//! overrides on top. The token is never read from or written to the file;
//! it comes from `TWITCH_TOKEN` or is set by the embedding application.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};

use crate::constants;

/// Client configuration.
#[derive(Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    /// PubSub WebSocket endpoint.
    pub pubsub_url: String,
    /// Base URL for Helix user lookups.
    pub helix_url: String,
    /// Application client id sent with Helix requests.
    pub client_id: String,
    /// OAuth token - NOT serialized to disk.
    #[serde(skip)]
    pub token: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pubsub_url: constants::PUBSUB_URL.to_string(),
            helix_url: constants::HELIX_URL.to_string(),
            client_id: String::new(),
            token: String::new(),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("pubsub_url", &self.pubsub_url)
            .field("helix_url", &self.helix_url)
            .field("client_id", &self.client_id)
            .field("has_token", &!self.token.is_empty())
            .finish()
    }
}

impl Config {
    /// Default config file location (`<platform config dir>/twitch-pubsub/config.json`).
    pub fn default_path() -> Result<PathBuf> {
        Ok(dirs::config_dir()
            .context("Could not determine config directory")?
            .join("twitch-pubsub")
            .join("config.json"))
    }

    /// Loads configuration from the default path (if present), with
    /// environment variable overrides.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = if path.exists() {
            Self::load_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Loads configuration from `path`, with environment variable overrides.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let mut config = Self::load_file(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("TWITCH_PUBSUB_URL") {
            self.pubsub_url = url;
        }

        if let Some(url) = lookup("TWITCH_HELIX_URL") {
            self.helix_url = url;
        }

        if let Some(client_id) = lookup("TWITCH_CLIENT_ID") {
            self.client_id = client_id;
        }

        if let Some(token) = lookup("TWITCH_TOKEN") {
            self.token = token;
        }
    }
}
