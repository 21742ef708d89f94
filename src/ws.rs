//! WebSocket transport.
//!
//! Thin wrapper around `tokio-tungstenite` providing type-isolated
//! reader/writer halves. The rest of the crate talks to the socket only
//! through this module.
//!
//! [`connect`] performs the handshake and returns a ([`WsWriter`], [`WsReader`])
//! pair so the send path and the receive path can be locked independently.

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite;

use crate::error::{PubSubError, Result};

/// Concrete WebSocket stream type (avoids repeating the generic everywhere).
type WsStream = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Received WebSocket message.
#[derive(Debug)]
pub enum WsMessage {
    /// UTF-8 text frame.
    Text(String),
    /// Binary frame.
    Binary(Vec<u8>),
    /// Ping frame with payload.
    Ping(Vec<u8>),
    /// Pong frame with payload.
    Pong(Vec<u8>),
    /// Close frame with status code and reason.
    Close {
        /// WebSocket close code (1000 = normal, 1005 = no code).
        code: u16,
        /// Human-readable close reason.
        reason: String,
    },
}

/// Write half of a WebSocket connection.
#[derive(Debug)]
pub struct WsWriter {
    sink: futures_util::stream::SplitSink<WsStream, tungstenite::Message>,
}

impl WsWriter {
    /// Send a UTF-8 text frame.
    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.sink
            .send(tungstenite::Message::Text(text.to_string()))
            .await
            .map_err(|e| PubSubError::Transport(format!("WebSocket send failed: {e}")))
    }

    /// Send a pong frame in response to a ping.
    pub async fn send_pong(&mut self, data: Vec<u8>) -> Result<()> {
        self.sink
            .send(tungstenite::Message::Pong(data))
            .await
            .map_err(|e| PubSubError::Transport(format!("WebSocket send_pong failed: {e}")))
    }

    /// Send a close frame and close the sink.
    pub async fn close(&mut self) -> Result<()> {
        self.sink
            .close()
            .await
            .map_err(|e| PubSubError::Transport(format!("WebSocket close failed: {e}")))
    }
}

/// Read half of a WebSocket connection.
#[derive(Debug)]
pub struct WsReader {
    stream: futures_util::stream::SplitStream<WsStream>,
}

impl WsReader {
    /// Receive the next message, returning `None` when the stream ends.
    ///
    /// Raw `Frame` variants are skipped internally.
    pub async fn recv(&mut self) -> Option<Result<WsMessage>> {
        loop {
            let msg = match self.stream.next().await? {
                Ok(tungstenite::Message::Text(text)) => WsMessage::Text(text.to_string()),
                Ok(tungstenite::Message::Binary(data)) => WsMessage::Binary(data.to_vec()),
                Ok(tungstenite::Message::Ping(data)) => WsMessage::Ping(data.to_vec()),
                Ok(tungstenite::Message::Pong(data)) => WsMessage::Pong(data.to_vec()),
                Ok(tungstenite::Message::Close(close_frame)) => {
                    let (code, reason) = close_frame
                        .map(|cf| (cf.code.into(), cf.reason.to_string()))
                        .unwrap_or((1005, String::new()));
                    WsMessage::Close { code, reason }
                }
                Ok(tungstenite::Message::Frame(_)) => continue,
                Err(e) => {
                    return Some(Err(PubSubError::Transport(format!(
                        "WebSocket read error: {e}"
                    ))));
                }
            };
            return Some(Ok(msg));
        }
    }
}

/// Connect to a WebSocket URL.
///
/// Performs the handshake (TLS for `wss://`) and returns split
/// (writer, reader) halves.
pub async fn connect(url: &str) -> Result<(WsWriter, WsReader)> {
    let (ws_stream, _response) = tokio_tungstenite::connect_async(url)
        .await
        .map_err(|e| PubSubError::Transport(format!("WebSocket connect to {url} failed: {e}")))?;

    let (sink, stream) = ws_stream.split();

    Ok((WsWriter { sink }, WsReader { stream }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_invalid_url_returns_error() {
        let result = connect("not-a-url").await;
        assert!(matches!(result, Err(PubSubError::Transport(_))));
    }

    #[tokio::test]
    async fn test_connect_unreachable_host_returns_error() {
        let result = connect("ws://127.0.0.1:1/invalid").await;
        assert!(matches!(result, Err(PubSubError::Transport(_))));
    }
}
