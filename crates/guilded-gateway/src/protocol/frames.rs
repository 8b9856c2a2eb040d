//! Frame codec
//!
//! Outbound application frames are `42` + JSON. Inbound frames may carry any
//! number of leading transport digits (`0` open, `40` namespace connect,
//! `42` event, `3` pong); purely numeric frames carry no document at all.

use std::time::Duration;

use serde_json::{Map, Value};

/// Transport ping, sent raw
pub const HEARTBEAT: &str = "2";
/// Transport pong, the server's answer to [`HEARTBEAT`]
pub const PONG: &str = "3";
/// Prefix of application event frames
pub const EVENT_PREFIX: &str = "42";

/// A frame to send to the gateway
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundFrame {
    /// Sent verbatim
    Raw(String),
    /// Serialized as `42<json>`
    Event(Value),
}

impl OutboundFrame {
    #[must_use]
    pub fn heartbeat() -> Self {
        Self::Raw(HEARTBEAT.to_string())
    }

    /// Sent before a clean close
    #[must_use]
    pub fn logout() -> Self {
        Self::Event(Value::Array(vec![Value::String("logout".to_string())]))
    }

    /// Application event `[name, data]`
    #[must_use]
    pub fn event(name: &str, data: Value) -> Self {
        Self::Event(Value::Array(vec![Value::String(name.to_string()), data]))
    }

    /// Wire text for this frame
    #[must_use]
    pub fn encode(&self) -> String {
        match self {
            Self::Raw(raw) => raw.clone(),
            Self::Event(body) => format!("{EVENT_PREFIX}{body}"),
        }
    }

    #[must_use]
    pub fn is_heartbeat(&self) -> bool {
        matches!(self, Self::Raw(raw) if raw == HEARTBEAT)
    }
}

/// Handshake frame, the first document the server sends on a new socket
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelloFrame {
    pub sid: String,
    pub upgrades: Vec<String>,
    pub ping_interval: Duration,
}

/// Application event: wire `type` plus the remaining fields
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedEvent {
    pub kind: String,
    pub payload: Value,
}

/// A decoded inbound frame
#[derive(Debug, Clone, PartialEq)]
pub enum InboundFrame {
    Hello(HelloFrame),
    Event(DecodedEvent),
    /// Pong for a previously sent heartbeat
    Pong,
}

/// Errors decoding an inbound frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("invalid JSON: {0}")]
    Json(String),

    #[error("unexpected document shape: {0}")]
    Shape(&'static str),

    #[error("handshake frame missing `{0}`")]
    MissingField(&'static str),
}

/// Decode an inbound text frame.
///
/// Returns `Ok(None)` for frames that carry nothing to act on: transport
/// acknowledgements (purely numeric frames other than a pong) and documents
/// with neither a session id nor an event type.
pub fn decode(raw: &str) -> Result<Option<InboundFrame>, FrameError> {
    if raw == PONG {
        return Ok(Some(InboundFrame::Pong));
    }
    if raw.bytes().all(|b| b.is_ascii_digit()) {
        return Ok(None);
    }

    let body = raw.trim_start_matches(|c: char| c.is_ascii_digit());
    let document: Value = serde_json::from_str(body).map_err(|e| FrameError::Json(e.to_string()))?;
    let mut object = normalize(document)?;

    if object.contains_key("sid") {
        return hello(&object).map(|hello| Some(InboundFrame::Hello(hello)));
    }

    match object.remove("type") {
        Some(Value::String(kind)) => Ok(Some(InboundFrame::Event(DecodedEvent {
            kind,
            payload: Value::Object(object),
        }))),
        Some(_) => Err(FrameError::Shape("event type is not a string")),
        None => {
            tracing::debug!(frame = %raw, "Ignoring untyped gateway document");
            Ok(None)
        }
    }
}

/// Reduce `{..}` and `[name-or-ack, {..}]` documents to the object form.
///
/// When the array form names the event in its first element and the object
/// has no `type` of its own, the name becomes the type.
fn normalize(document: Value) -> Result<Map<String, Value>, FrameError> {
    match document {
        Value::Object(object) => Ok(object),
        Value::Array(items) => {
            let mut items = items.into_iter();
            let head = items.next();
            match items.next() {
                Some(Value::Object(mut object)) => {
                    if let Some(Value::String(name)) = head {
                        object.entry("type").or_insert(Value::String(name));
                    }
                    Ok(object)
                }
                Some(_) => Err(FrameError::Shape("array payload is not an object")),
                None => Err(FrameError::Shape("array frame without payload")),
            }
        }
        _ => Err(FrameError::Shape("expected an object or array")),
    }
}

fn hello(object: &Map<String, Value>) -> Result<HelloFrame, FrameError> {
    let sid = object
        .get("sid")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingField("sid"))?
        .to_string();
    let ping_interval = object
        .get("pingInterval")
        .and_then(Value::as_u64)
        .ok_or(FrameError::MissingField("pingInterval"))?;
    let upgrades = object
        .get("upgrades")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    Ok(HelloFrame {
        sid,
        upgrades,
        ping_interval: Duration::from_millis(ping_interval),
    })
}
