//! Collaborators the client consumes: channel-id lookup and auth tokens.
//!
//! The client never knows where ids or tokens come from. It is handed an
//! [`IdentityResolver`] and a [`CredentialProvider`] at construction time.
//! [`HelixIdentityResolver`] and [`StaticCredentials`] cover the common case
//! of talking to Twitch directly; [`StaticIdentityResolver`] serves embedders
//! that already hold a name → id table.

use std::collections::HashMap;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::Config;
use crate::constants;

/// Numeric account identifier of a channel.
pub type AccountId = u64;

/// Maps a channel name to its numeric account id.
#[async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Resolve `channel_name`, returning `None` if the channel is unknown.
    async fn resolve_account_id(&self, channel_name: &str) -> Option<AccountId>;
}

/// Supplies the current authorization token.
pub trait CredentialProvider: Send + Sync {
    /// Current token, without any `oauth:` prefix.
    fn current_token(&self) -> String;
}

/// Strip the IRC-style `oauth:` prefix from a token.
#[must_use]
pub fn strip_oauth_prefix(token: &str) -> &str {
    token.strip_prefix("oauth:").unwrap_or(token)
}

/// Fixed token supplied up front.
#[derive(Clone)]
pub struct StaticCredentials {
    token: String,
}

impl StaticCredentials {
    /// Wrap `token`, stripping a leading `oauth:` if present.
    #[must_use]
    pub fn new(token: &str) -> Self {
        Self {
            token: strip_oauth_prefix(token).to_string(),
        }
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

impl CredentialProvider for StaticCredentials {
    fn current_token(&self) -> String {
        self.token.clone()
    }
}

/// In-memory name → id table.
#[derive(Debug, Clone, Default)]
pub struct StaticIdentityResolver {
    ids: HashMap<String, AccountId>,
}

impl StaticIdentityResolver {
    /// Create an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `channel_name` → `id`. Names are matched case-insensitively.
    #[must_use]
    pub fn with(mut self, channel_name: &str, id: AccountId) -> Self {
        self.ids.insert(channel_name.to_lowercase(), id);
        self
    }
}

#[async_trait]
impl IdentityResolver for StaticIdentityResolver {
    async fn resolve_account_id(&self, channel_name: &str) -> Option<AccountId> {
        self.ids.get(&channel_name.to_lowercase()).copied()
    }
}

/// Response body of `GET /helix/users`.
#[derive(Debug, Deserialize)]
struct UsersResponse {
    data: Vec<HelixUser>,
}

#[derive(Debug, Deserialize)]
struct HelixUser {
    id: String,
}

/// Resolves channel names through the Helix `users` endpoint.
#[derive(Clone)]
pub struct HelixIdentityResolver {
    client: Client,
    api_url: String,
    client_id: String,
    token: String,
}

impl std::fmt::Debug for HelixIdentityResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HelixIdentityResolver")
            .field("api_url", &self.api_url)
            .field("client_id", &self.client_id)
            .finish_non_exhaustive()
    }
}

impl HelixIdentityResolver {
    /// Creates a resolver against `api_url` (e.g. `https://api.twitch.tv`).
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(api_url: &str, client_id: &str, token: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(constants::HTTP_REQUEST_TIMEOUT)
            .build()
            .context("Failed to build Helix HTTP client")?;

        Ok(Self {
            client,
            api_url: api_url.trim_end_matches('/').to_string(),
            client_id: client_id.to_string(),
            token: strip_oauth_prefix(token).to_string(),
        })
    }

    /// Creates a resolver from the Helix settings in `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        Self::new(&config.helix_url, &config.client_id, &config.token)
    }

    async fn lookup(&self, channel_name: &str) -> anyhow::Result<Option<AccountId>> {
        let url = format!("{}/helix/users", self.api_url);

        let response = self
            .client
            .get(&url)
            .query(&[("login", channel_name)])
            .header("Client-Id", &self.client_id)
            .bearer_auth(&self.token)
            .send()
            .await
            .context("Helix users request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("Helix users lookup returned {}", response.status());
        }

        let users: UsersResponse = response
            .json()
            .await
            .context("Invalid Helix users response")?;

        let Some(user) = users.data.into_iter().next() else {
            return Ok(None);
        };

        let id = user
            .id
            .parse::<AccountId>()
            .with_context(|| format!("Non-numeric user id: {}", user.id))?;
        Ok(Some(id))
    }
}

#[async_trait]
impl IdentityResolver for HelixIdentityResolver {
    async fn resolve_account_id(&self, channel_name: &str) -> Option<AccountId> {
        match self.lookup(channel_name).await {
            Ok(id) => id,
            Err(e) => {
                log::warn!("[PubSub] Helix lookup for \"{}\" failed: {:#}", channel_name, e);
                None
            }
        }
    }
}
