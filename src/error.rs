//! Errors surfaced by the PubSub client.
//!
//! Channel-name resolution failures never appear here: they are logged and
//! the affected topic is dropped. Everything in [`PubSubError`] is something
//! the caller has to act on.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PubSubError>;

/// Errors that can occur during PubSub operations.
#[derive(Error, Debug)]
pub enum PubSubError {
    /// Connect, send or receive failed at the transport level.
    #[error("Transport failure: {0}")]
    Transport(String),
    /// The remote side closed the connection or the stream ended.
    #[error("Connection closed (code {code}): {reason}")]
    ConnectionClosed {
        /// WebSocket close code (1000 = normal, 1005 = no code).
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
    /// A read was attempted with no live connection.
    #[error("Not connected")]
    NotConnected,
    /// A binary frame did not contain valid UTF-8.
    #[error("Invalid UTF-8 in binary frame: {0}")]
    Decode(#[from] std::string::FromUtf8Error),
    /// An outbound request could not be serialized.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl PubSubError {
    /// Returns `true` if the connection is gone and the caller should
    /// reconnect (by calling `listen`/`connect` again) rather than keep reading.
    #[must_use]
    pub fn is_disconnect(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::ConnectionClosed { .. } | Self::NotConnected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_closed_display() {
        let err = PubSubError::ConnectionClosed {
            code: 1000,
            reason: "bye".to_string(),
        };
        assert_eq!(err.to_string(), "Connection closed (code 1000): bye");
    }

    #[test]
    fn test_is_disconnect() {
        assert!(PubSubError::NotConnected.is_disconnect());
        assert!(PubSubError::Transport("reset".into()).is_disconnect());
        assert!(PubSubError::ConnectionClosed {
            code: 1005,
            reason: String::new()
        }
        .is_disconnect());

        let bad_utf8 = String::from_utf8(vec![0xff, 0xfe]).unwrap_err();
        assert!(!PubSubError::from(bad_utf8).is_disconnect());
    }
}
