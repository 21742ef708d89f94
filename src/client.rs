//! PubSub client: subscription requests out, raw frames in.
//!
//! ```text
//!   listen(channel, points, chat)
//!     1. ensure_connected()          (settle delay on a fresh socket)
//!     2. sleep SUBSCRIBE_REQUEST_SPACING
//!     3. resolve topics              (unresolvable topics dropped)
//!     4. empty? → return Ok(())
//!     5. send one LISTEN frame
//!
//!   read_one()  → next text payload from the current connection
//! ```
//!
//! All methods take `&self`; wrap the client in an `Arc` to read from one
//! task while subscribing from another. Sends and receives use separate
//! halves of the socket and do not block each other.

use std::sync::Arc;

use crate::config::Config;
use crate::connection::{Connection, ConnectionManager, ConnectionState};
use crate::constants::{PUBSUB_URL, SUBSCRIBE_REQUEST_SPACING};
use crate::error::{PubSubError, Result};
use crate::identity::{
    CredentialProvider, HelixIdentityResolver, IdentityResolver, StaticCredentials,
};
use crate::protocol;
use crate::topic::TopicBuilder;

/// Client for the PubSub service.
#[derive(Debug)]
pub struct PubSubClient<R, C> {
    connection: ConnectionManager,
    topics: TopicBuilder<R>,
    credentials: C,
}

impl PubSubClient<HelixIdentityResolver, StaticCredentials> {
    /// Build a client that resolves channels through Helix, using the
    /// endpoint, client id and token from `config`.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let resolver = HelixIdentityResolver::from_config(config)?;
        Ok(Self::with_url(
            &config.pubsub_url,
            resolver,
            StaticCredentials::new(&config.token),
        ))
    }
}

impl<R: IdentityResolver, C: CredentialProvider> PubSubClient<R, C> {
    /// Create a client for the default PubSub endpoint.
    pub fn new(resolver: R, credentials: C) -> Self {
        Self::with_url(PUBSUB_URL, resolver, credentials)
    }

    /// Create a client for an explicit endpoint.
    pub fn with_url(url: &str, resolver: R, credentials: C) -> Self {
        Self {
            connection: ConnectionManager::new(url),
            topics: TopicBuilder::new(resolver),
            credentials,
        }
    }

    /// Whether a live connection exists.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Open a fresh connection now instead of on first use.
    pub async fn connect(&self) -> Result<()> {
        self.connection.connect().await.map(|_| ())
    }

    /// Close the connection. The next send path reconnects.
    pub async fn disconnect(&self) {
        self.connection.disconnect().await;
    }

    /// Subscribe to `channel_name`'s points and/or chat moderation topics.
    pub async fn listen(&self, channel_name: &str, want_points: bool, want_chat: bool) -> Result<()> {
        self.listen_with_nonce(channel_name, want_points, want_chat, None)
            .await
    }

    /// Like [`Self::listen`], attaching `nonce` as the correlation token.
    ///
    /// Topics that fail to resolve are dropped. If none remain, nothing is
    /// sent and the call succeeds. Send failures are returned as-is; the
    /// next call reconnects.
    pub async fn listen_with_nonce(
        &self,
        channel_name: &str,
        want_points: bool,
        want_chat: bool,
        nonce: Option<&str>,
    ) -> Result<()> {
        let conn = self.connection.ensure_connected().await?;

        tokio::time::sleep(SUBSCRIBE_REQUEST_SPACING).await;

        let topics = self
            .topics
            .build_topics(channel_name, want_points, want_chat)
            .await;

        if topics.is_empty() {
            log::debug!(
                "[PubSub] No topics resolved for \"{}\", skipping LISTEN",
                channel_name
            );
            return Ok(());
        }

        let payload =
            protocol::build_listen_payload(nonce, &topics, &self.credentials.current_token())?;
        send(&conn, &payload).await?;

        log::debug!(
            "[PubSub] Sent LISTEN for \"{}\" ({} topics)",
            channel_name,
            topics.len()
        );
        Ok(())
    }

    /// Send an application-level PING. The service answers with a PONG frame.
    pub async fn ping(&self) -> Result<()> {
        let conn = self.connection.ensure_connected().await?;
        send(&conn, &protocol::build_ping_payload()?).await?;
        log::trace!("[PubSub] Sent PING");
        Ok(())
    }

    /// Wait for the next inbound frame as text.
    ///
    /// Frames that arrived before a server close are still returned, then
    /// the close itself as [`PubSubError::ConnectionClosed`]. After that, or
    /// with no connection at all, this returns [`PubSubError::NotConnected`].
    /// It never reconnects on its own.
    pub async fn read_one(&self) -> Result<String> {
        let conn = self.connection.latest().ok_or(PubSubError::NotConnected)?;
        let text = conn.recv_text().await?;
        log::trace!("[PubSub] Received {} bytes", text.len());
        Ok(text)
    }
}

async fn send(conn: &Arc<Connection>, payload: &str) -> Result<()> {
    conn.send_text(payload).await.inspect_err(|e| {
        log::warn!("[PubSub] Send failed: {}", e);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::StaticIdentityResolver;

    fn client(url: &str) -> PubSubClient<StaticIdentityResolver, StaticCredentials> {
        PubSubClient::with_url(
            url,
            StaticIdentityResolver::new().with("shroud", 12345),
            StaticCredentials::new("oauth:tok"),
        )
    }

    #[test]
    fn test_new_client_not_connected() {
        let client = client("ws://127.0.0.1:1");
        assert!(!client.is_connected());
        assert_eq!(client.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_read_one_without_connection() {
        let client = client("ws://127.0.0.1:1");
        assert!(matches!(client.read_one().await, Err(PubSubError::NotConnected)));
    }

    #[tokio::test]
    async fn test_listen_surfaces_connect_failure() {
        let client = client("ws://127.0.0.1:1");
        let err = client.listen("shroud", true, true).await.unwrap_err();
        assert!(matches!(err, PubSubError::Transport(_)));
        assert!(err.is_disconnect());
    }

    #[test]
    fn test_from_config_uses_configured_url() {
        let config = Config {
            pubsub_url: "ws://127.0.0.1:9".to_string(),
            ..Config::default()
        };
        let client = PubSubClient::from_config(&config).expect("client builds");
        assert_eq!(client.connection.url(), "ws://127.0.0.1:9");
    }
}
