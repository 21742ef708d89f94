//! Connection lifecycle for the PubSub WebSocket.
//!
//! # Architecture
//!
//! ```text
//!   ConnectionManager
//!         │  ensure_connected()  ──► reuse live Connection
//!         │                      └─► handshake, settle, install new Connection
//!         ▼
//!   Arc<Connection>
//!     ├── Mutex<WsWriter>          send path (listen, ping, pong)
//!     └── reader task ──► mpsc ──► recv_text (read_one)
//! ```
//!
//! Each connection owns one reader task that drains the socket, answers
//! pings and queues data frames. The task clears the open flag the moment
//! it sees a close frame, stream end or read error, so a server-side close
//! is visible to [`ConnectionManager::is_connected`] even while nobody is
//! reading. There is no reconnection task: a dead connection stays dead
//! until the next send path calls [`ConnectionManager::ensure_connected`],
//! which replaces it wholesale.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::constants::CONNECT_SETTLE_DELAY;
use crate::error::{PubSubError, Result};
use crate::ws::{self, WsMessage, WsReader, WsWriter};

/// Connection state as seen by the manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No live connection.
    #[default]
    Disconnected,
    /// Handshake (or post-handshake settle) in progress.
    Connecting,
    /// Connected and ready.
    Connected,
}

/// One WebSocket connection.
#[derive(Debug)]
pub struct Connection {
    writer: Arc<tokio::sync::Mutex<WsWriter>>,
    inbound: tokio::sync::Mutex<mpsc::UnboundedReceiver<Result<String>>>,
    open: Arc<AtomicBool>,
    reader_task: JoinHandle<()>,
}

impl Connection {
    fn new(writer: WsWriter, reader: WsReader) -> Self {
        let writer = Arc::new(tokio::sync::Mutex::new(writer));
        let open = Arc::new(AtomicBool::new(true));
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let reader_task = tokio::spawn(run_reader(
            reader,
            Arc::clone(&writer),
            Arc::clone(&open),
            inbound_tx,
        ));

        Self {
            writer,
            inbound: tokio::sync::Mutex::new(inbound_rx),
            open,
            reader_task,
        }
    }

    /// Whether the connection still reports itself open.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn mark_closed(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    /// Send a text frame. A failed send marks the connection dead.
    pub async fn send_text(&self, text: &str) -> Result<()> {
        if !self.is_open() {
            return Err(PubSubError::Transport("connection is closed".to_string()));
        }

        let result = self.writer.lock().await.send_text(text).await;
        if result.is_err() {
            self.mark_closed();
        }
        result
    }

    /// Wait for the next data frame as text.
    ///
    /// Frames queued before a close are still delivered, followed by the
    /// close itself as [`PubSubError::ConnectionClosed`]. After that the
    /// queue is exhausted and this returns [`PubSubError::NotConnected`].
    pub async fn recv_text(&self) -> Result<String> {
        self.inbound
            .lock()
            .await
            .recv()
            .await
            .unwrap_or(Err(PubSubError::NotConnected))
    }

    /// Close the connection, sending a close frame if the socket allows it.
    pub async fn close(&self) {
        self.mark_closed();
        if let Err(e) = self.writer.lock().await.close().await {
            log::debug!("[PubSub] Close failed: {}", e);
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.reader_task.abort();
    }
}

/// Reader loop for one connection.
///
/// Queues text (binary decoded as UTF-8) for [`Connection::recv_text`].
/// On close, stream end or read error it clears `open`, queues the
/// terminal error and exits.
async fn run_reader(
    mut reader: WsReader,
    writer: Arc<tokio::sync::Mutex<WsWriter>>,
    open: Arc<AtomicBool>,
    inbound_tx: mpsc::UnboundedSender<Result<String>>,
) {
    let terminal = loop {
        match reader.recv().await {
            Some(Ok(WsMessage::Text(text))) => {
                let _ = inbound_tx.send(Ok(text));
            }
            Some(Ok(WsMessage::Binary(data))) => {
                let _ = inbound_tx.send(String::from_utf8(data).map_err(PubSubError::from));
            }
            Some(Ok(WsMessage::Ping(data))) => {
                if let Err(e) = writer.lock().await.send_pong(data).await {
                    log::debug!("[PubSub] Failed to answer ping: {}", e);
                }
            }
            Some(Ok(WsMessage::Pong(_))) => {}
            Some(Ok(WsMessage::Close { code, reason })) => {
                log::info!("[PubSub] Connection closed by server (code {})", code);
                break PubSubError::ConnectionClosed { code, reason };
            }
            Some(Err(e)) => {
                log::warn!("[PubSub] WebSocket error: {}", e);
                break e;
            }
            None => {
                log::info!("[PubSub] WebSocket stream ended");
                break PubSubError::ConnectionClosed {
                    code: 1006,
                    reason: "stream ended".to_string(),
                };
            }
        }
    };

    open.store(false, Ordering::SeqCst);
    let _ = inbound_tx.send(Err(terminal));
}

/// Owns the single connection to the PubSub endpoint.
#[derive(Debug)]
pub struct ConnectionManager {
    url: String,
    current: Mutex<Option<Arc<Connection>>>,
    connect_lock: tokio::sync::Mutex<()>,
}

impl ConnectionManager {
    /// Create a manager for `url`. Nothing is connected until first use.
    #[must_use]
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            current: Mutex::new(None),
            connect_lock: tokio::sync::Mutex::new(()),
        }
    }

    /// Endpoint this manager connects to.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The current connection, if it is still open.
    #[must_use]
    pub fn current(&self) -> Option<Arc<Connection>> {
        self.latest().filter(|conn| conn.is_open())
    }

    /// The most recently installed connection, open or not.
    ///
    /// A closed connection may still hold frames that arrived before the close.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<Connection>> {
        self.current
            .lock()
            .expect("connection slot mutex poisoned")
            .as_ref()
            .map(Arc::clone)
    }

    /// `true` only if a connection exists and reports itself open.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.current().is_some()
    }

    /// Current lifecycle state.
    ///
    /// `Connecting` while a handshake holds the connect lock; an abandoned
    /// handshake releases the lock when its future is dropped.
    #[must_use]
    pub fn state(&self) -> ConnectionState {
        if self.connect_lock.try_lock().is_err() {
            ConnectionState::Connecting
        } else if self.is_connected() {
            ConnectionState::Connected
        } else {
            ConnectionState::Disconnected
        }
    }

    /// Return the live connection, connecting first if there is none.
    ///
    /// A fresh connection is returned only after [`CONNECT_SETTLE_DELAY`].
    pub async fn ensure_connected(&self) -> Result<Arc<Connection>> {
        if let Some(conn) = self.current() {
            return Ok(conn);
        }

        let _guard = self.connect_lock.lock().await;

        // Another caller may have connected while we waited for the lock
        if let Some(conn) = self.current() {
            return Ok(conn);
        }

        self.establish().await
    }

    /// Open a fresh connection, replacing any existing one.
    pub async fn connect(&self) -> Result<Arc<Connection>> {
        let _guard = self.connect_lock.lock().await;
        self.establish().await
    }

    /// Close the current connection, if any.
    pub async fn disconnect(&self) {
        let previous = self
            .current
            .lock()
            .expect("connection slot mutex poisoned")
            .take();

        if let Some(conn) = previous {
            log::info!("[PubSub] Disconnecting from {}", self.url);
            conn.close().await;
        }
    }

    /// Handshake, settle, then install. Caller holds `connect_lock`.
    async fn establish(&self) -> Result<Arc<Connection>> {
        let stale = self
            .current
            .lock()
            .expect("connection slot mutex poisoned")
            .take();
        if let Some(conn) = stale {
            conn.close().await;
        }

        log::info!("[PubSub] Connecting to {}", self.url);

        let (writer, reader) = ws::connect(&self.url).await.inspect_err(|e| {
            log::warn!("[PubSub] Connection failed: {}", e);
        })?;

        log::info!("[PubSub] WebSocket connected");
        let conn = Arc::new(Connection::new(writer, reader));
        tokio::time::sleep(CONNECT_SETTLE_DELAY).await;

        *self.current.lock().expect("connection slot mutex poisoned") = Some(Arc::clone(&conn));
        Ok(conn)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn test_new_manager_is_disconnected() {
        let manager = ConnectionManager::new("ws://127.0.0.1:1");
        assert!(!manager.is_connected());
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(manager.current().is_none());
        assert!(manager.latest().is_none());
    }

    #[tokio::test]
    async fn test_failed_connect_returns_to_disconnected() {
        let manager = ConnectionManager::new("ws://127.0.0.1:1");
        let result = manager.ensure_connected().await;
        assert!(matches!(result, Err(PubSubError::Transport(_))));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_disconnect_without_connection_is_noop() {
        let manager = ConnectionManager::new("ws://127.0.0.1:1");
        manager.disconnect().await;
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_abandoned_handshake_returns_to_disconnected() {
        // Accepts TCP but never answers the WebSocket handshake
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let holder = tokio::spawn(async move {
            let (_stream, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let manager = Arc::new(ConnectionManager::new(&url));
        let handshake = {
            let manager = Arc::clone(&manager);
            tokio::spawn(async move { manager.ensure_connected().await.map(|_| ()) })
        };

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(manager.state(), ConnectionState::Connecting);

        handshake.abort();
        let _ = handshake.await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        holder.abort();
    }
}
