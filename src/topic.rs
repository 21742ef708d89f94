//! Topic construction.
//!
//! A topic is `<kind-prefix>.<account-id>`. The account id is looked up on
//! every call; caching is the resolver's business.

use std::fmt;

use serde::Serialize;

use crate::identity::IdentityResolver;

/// Kinds of event stream a channel can be subscribed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TopicKind {
    /// Channel subscription events.
    ChannelPoints,
    /// Chat moderator actions.
    ChatModeration,
}

impl TopicKind {
    /// Fixed topic prefix for this kind.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::ChannelPoints => "channel-subscribe-events-v1",
            Self::ChatModeration => "chat_moderator_actions",
        }
    }
}

/// A subscribable topic string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    /// Build the topic for `kind` on account `id`.
    #[must_use]
    pub fn new(kind: TopicKind, id: u64) -> Self {
        Self(format!("{}.{}", kind.prefix(), id))
    }

    /// Topic string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Topic {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Resolves channel names into topics.
#[derive(Debug)]
pub struct TopicBuilder<R> {
    resolver: R,
}

impl<R: IdentityResolver> TopicBuilder<R> {
    /// Create a builder over `resolver`.
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }

    /// Build the `kind` topic for `channel_name`.
    ///
    /// Returns `None` (with a warning) when the channel cannot be resolved.
    /// Callers skip that topic; it is never fatal.
    pub async fn build_topic(&self, channel_name: &str, kind: TopicKind) -> Option<Topic> {
        let Some(id) = self.resolver.resolve_account_id(channel_name).await else {
            log::warn!(
                "[PubSub] Unable to get user id for channel \"{}\", skipping {} topic",
                channel_name,
                kind.prefix()
            );
            return None;
        };

        Some(Topic::new(kind, id))
    }

    /// Build every requested topic for `channel_name`, points first, dropping
    /// the ones that fail to resolve.
    pub async fn build_topics(
        &self,
        channel_name: &str,
        want_points: bool,
        want_chat: bool,
    ) -> Vec<Topic> {
        let mut topics = Vec::with_capacity(2);

        if want_points {
            topics.extend(self.build_topic(channel_name, TopicKind::ChannelPoints).await);
        }

        if want_chat {
            topics.extend(self.build_topic(channel_name, TopicKind::ChatModeration).await);
        }

        topics
    }
}
