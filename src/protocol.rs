//! Outbound PubSub request framing.
//!
//! ```text
//! {"type": "LISTEN", "data": {"topics": [...], "auth_token": "..."}, "nonce": "..."}
//! {"type": "PING"}
//! ```
//!
//! `nonce` is the correlation token; the service echoes it in the matching
//! `RESPONSE` frame. It is omitted when the caller supplies none.

use serde::Serialize;

use crate::error::Result;
use crate::topic::Topic;

/// Request type tag for topic subscriptions.
pub const LISTEN: &str = "LISTEN";

/// Request type tag for application-level keepalive.
pub const PING: &str = "PING";

#[derive(Debug, Serialize)]
struct ListenRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    data: ListenData<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nonce: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct ListenData<'a> {
    topics: &'a [Topic],
    auth_token: &'a str,
}

#[derive(Debug, Serialize)]
struct PingRequest {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Serialize a LISTEN request for `topics`.
pub fn build_listen_payload(
    nonce: Option<&str>,
    topics: &[Topic],
    auth_token: &str,
) -> Result<String> {
    let request = ListenRequest {
        kind: LISTEN,
        data: ListenData { topics, auth_token },
        nonce,
    };
    Ok(serde_json::to_string(&request)?)
}

/// Serialize a PING request.
pub fn build_ping_payload() -> Result<String> {
    Ok(serde_json::to_string(&PingRequest { kind: PING })?)
}

/// Fresh random correlation token.
#[must_use]
pub fn generate_nonce() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topic::TopicKind;

    fn shroud_topics() -> Vec<Topic> {
        vec![
            Topic::new(TopicKind::ChannelPoints, 12345),
            Topic::new(TopicKind::ChatModeration, 12345),
        ]
    }

    #[test]
    fn test_listen_payload_matches_wire_format() {
        let payload = build_listen_payload(None, &shroud_topics(), "tok").expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&payload).expect("valid JSON");

        assert_eq!(
            value,
            serde_json::json!({
                "type": "LISTEN",
                "data": {
                    "topics": [
                        "channel-subscribe-events-v1.12345",
                        "chat_moderator_actions.12345"
                    ],
                    "auth_token": "tok"
                }
            })
        );
    }

    #[test]
    fn test_listen_payload_with_nonce() {
        let payload =
            build_listen_payload(Some("abc"), &shroud_topics(), "tok").expect("serializes");
        let value: serde_json::Value = serde_json::from_str(&payload).expect("valid JSON");
        assert_eq!(value["nonce"], "abc");
        assert_eq!(value["type"], "LISTEN");
    }

    #[test]
    fn test_listen_payload_without_nonce_has_no_field() {
        let payload = build_listen_payload(None, &shroud_topics(), "tok").expect("serializes");
        assert!(!payload.contains("nonce"));
    }

    #[test]
    fn test_ping_payload() {
        assert_eq!(build_ping_payload().expect("serializes"), r#"{"type":"PING"}"#);
    }

    #[test]
    fn test_generate_nonce_unique() {
        let a = generate_nonce();
        let b = generate_nonce();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }
}
