//! Twitch PubSub client.
//!
//! Connects to the PubSub WebSocket, subscribes to per-channel topics with
//! `LISTEN` requests and hands inbound frames back to the caller as text.
//!
//! # Architecture
//!
//! - **PubSubClient** - subscription requests and inbound reads
//! - **ConnectionManager** - owns the single socket, reconnects on demand
//! - **TopicBuilder** - channel name → `<kind>.<account-id>` topic
//! - **IdentityResolver / CredentialProvider** - injected collaborators
//!
//! # Modules
//!
//! - [`client`] - high-level client
//! - [`connection`] - connection lifecycle
//! - [`protocol`] - outbound request framing
//! - [`topic`] - topic construction
//! - [`identity`] - id resolution and credentials
//! - [`config`] - configuration loading
//!
//! # Usage
//!
//! ```no_run
//! use twitch_pubsub::{PubSubClient, StaticCredentials, StaticIdentityResolver};
//!
//! # async fn run() -> twitch_pubsub::Result<()> {
//! let resolver = StaticIdentityResolver::new().with("shroud", 12345);
//! let client = PubSubClient::new(resolver, StaticCredentials::new("oauth:token"));
//!
//! client.listen("shroud", true, true).await?;
//! loop {
//!     let frame = client.read_one().await?;
//!     println!("{frame}");
//! }
//! # }
//! ```

pub mod client;
pub mod config;
pub mod connection;
pub mod constants;
pub mod error;
pub mod identity;
pub mod protocol;
pub mod topic;
pub mod ws;

// Re-export commonly used types
pub use client::PubSubClient;
pub use config::Config;
pub use connection::ConnectionState;
pub use error::{PubSubError, Result};
pub use identity::{
    AccountId, CredentialProvider, HelixIdentityResolver, IdentityResolver, StaticCredentials,
    StaticIdentityResolver,
};
pub use topic::{Topic, TopicBuilder, TopicKind};
