//! Raw event payloads
//!
//! Published alongside (or instead of) resolved entities when the cache
//! cannot supply the full object.

use std::sync::Arc;

use guilded_core::payload::{get_str, unwrap_object};
use guilded_core::Message;
use serde_json::Value;

/// Argument of `raw_message_delete`
#[derive(Debug, Clone)]
pub struct RawMessageDelete {
    pub message_id: String,
    pub channel_id: Option<String>,
    pub team_id: Option<String>,
    /// The message as it was cached, if it was
    pub cached_message: Option<Message>,
    pub data: Arc<Value>,
}

impl RawMessageDelete {
    pub fn from_payload(data: &Value, cached_message: Option<Message>) -> Option<Self> {
        let message = unwrap_object(data, "message");
        Some(Self {
            message_id: get_str(message, "id")?,
            channel_id: get_str(data, "channelId").or_else(|| get_str(message, "channelId")),
            team_id: get_str(data, "teamId").or_else(|| get_str(message, "teamId")),
            cached_message,
            data: Arc::new(data.clone()),
        })
    }
}

/// Argument of the `raw_*_message_pinned`/`unpinned` events
#[derive(Debug, Clone)]
pub struct RawPinEvent {
    pub message_id: String,
    pub channel_id: Option<String>,
    /// Whether the pin happened in a team channel (as opposed to a DM)
    pub in_team: bool,
    pub data: Arc<Value>,
}

impl RawPinEvent {
    pub fn from_payload(data: &Value) -> Option<Self> {
        let message = unwrap_object(data, "message");
        Some(Self {
            message_id: get_str(message, "id")?,
            channel_id: get_str(data, "channelId").or_else(|| get_str(message, "channelId")),
            in_team: data.get("channelType").and_then(Value::as_str) == Some("Team"),
            data: Arc::new(data.clone()),
        })
    }
}
