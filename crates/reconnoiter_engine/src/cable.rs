//! ActionCable framing: the envelope the backend's websocket speaks.
//!
//! After the socket opens the server sends `welcome`; the client answers with
//! a `subscribe` command naming the channel. The server confirms or rejects
//! the subscription, pings periodically, and wraps broadcasts as
//! `{"identifier": .., "message": ..}`.

use reconnoiter_core::SessionId;
use serde::Deserialize;
use serde_json::{json, Value};

pub const DEFAULT_CHANNEL: &str = "ComparisonStatusChannel";

#[derive(Debug, Clone, PartialEq)]
pub enum CableFrame {
    Welcome,
    Ping,
    Confirmed,
    Rejected,
    Disconnect {
        reason: Option<String>,
    },
    Message {
        identifier: Option<String>,
        payload: Value,
    },
    Other(String),
}

#[derive(Deserialize)]
struct RawFrame {
    #[serde(rename = "type")]
    kind: Option<String>,
    identifier: Option<String>,
    message: Option<Value>,
    reason: Option<String>,
}

pub fn parse_frame(text: &str) -> Result<CableFrame, serde_json::Error> {
    let raw: RawFrame = serde_json::from_str(text)?;
    let frame = match raw.kind.as_deref() {
        Some("welcome") => CableFrame::Welcome,
        Some("ping") => CableFrame::Ping,
        Some("confirm_subscription") => CableFrame::Confirmed,
        Some("reject_subscription") => CableFrame::Rejected,
        Some("disconnect") => CableFrame::Disconnect { reason: raw.reason },
        Some(other) => CableFrame::Other(other.to_string()),
        None => match raw.message {
            Some(payload) => CableFrame::Message {
                identifier: raw.identifier,
                payload,
            },
            None => CableFrame::Other(String::new()),
        },
    };
    Ok(frame)
}

/// Subscription identifier. The server echoes this exact string back on
/// every frame for the subscription.
pub fn subscription_identifier(channel: &str, session_id: &SessionId) -> String {
    json!({ "channel": channel, "session_id": session_id.as_str() }).to_string()
}

pub fn subscribe_command(identifier: &str) -> String {
    json!({ "command": "subscribe", "identifier": identifier }).to_string()
}

pub fn unsubscribe_command(identifier: &str) -> String {
    json!({ "command": "unsubscribe", "identifier": identifier }).to_string()
}
