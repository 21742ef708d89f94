//! Protocol constants for the PubSub client.
//!
//! Endpoints and the fixed delays the client observes around the WebSocket
//! handshake and subscription requests live here so the timing contract is
//! visible in one place.
//!
//! # Categories
//!
//! - **Endpoints**: default service URLs
//! - **Delays**: handshake settle time and request pacing
//! - **Timeouts**: HTTP collaborator timeouts

use std::time::Duration;

// ============================================================================
// Endpoints
// ============================================================================

/// Default PubSub WebSocket endpoint.
pub const PUBSUB_URL: &str = "wss://pubsub-edge.twitch.tv";

/// Default base URL for Helix API lookups.
pub const HELIX_URL: &str = "https://api.twitch.tv";

// ============================================================================
// Delays
// ============================================================================

/// Pause after a fresh WebSocket handshake before the first send.
///
/// The service finishes its side of connection setup asynchronously; a
/// LISTEN sent immediately after the handshake can be dropped.
pub const CONNECT_SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Minimum pause before every LISTEN request.
///
/// Applied once per request regardless of connection freshness. Bounds the
/// rate of subscription requests issued to the service.
pub const SUBSCRIBE_REQUEST_SPACING: Duration = Duration::from_millis(500);

// ============================================================================
// Timeouts
// ============================================================================

/// HTTP client request timeout for Helix lookups.
pub const HTTP_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
