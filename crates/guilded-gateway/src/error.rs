//! Gateway error types

use std::time::Duration;

use thiserror::Error;

use crate::handlers::HandlerError;
use crate::protocol::{close_codes, FrameError};

/// Failure while building a socket session
#[derive(Debug, Clone, Error)]
pub enum ConnectError {
    /// The server rejected the WebSocket upgrade
    #[error("Handshake rejected with HTTP status {status}")]
    Handshake { status: u16 },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connect timed out after {0:?}")]
    Timeout(Duration),

    /// Connected, but the first frame was not a usable handshake
    #[error("Invalid handshake frame: {0}")]
    HandshakeFrame(String),
}

/// A translation failure for one wire event
#[derive(Debug, Clone, Error)]
#[error("Failed to handle {event}: {source}")]
pub struct ProtocolError {
    /// Wire event kind, e.g. `ChatMessageCreated`
    pub event: String,
    #[source]
    pub source: HandlerError,
}

/// Failure from `GatewaySession::poll_event`
#[derive(Debug, Clone, Error)]
pub enum PollError {
    /// The socket is closed or closing; the supervisor reconnects
    #[error("Socket closed ({})", describe_code(.code))]
    Closed { code: Option<u16> },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Undecodable frame: {0}")]
    Decode(#[from] FrameError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl PollError {
    /// Whether the session is gone and must be rebuilt
    pub fn is_disconnect(&self) -> bool {
        matches!(self, Self::Closed { .. } | Self::Transport(_))
    }
}

fn describe_code(code: &Option<u16>) -> String {
    code.map_or_else(|| "no close code".to_string(), close_codes::describe)
}

/// Failure of a `wait_for` call
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WaitError {
    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    /// The predicate failed while checking an event
    #[error("Check failed: {0}")]
    Check(String),

    /// The dispatcher went away before the event arrived
    #[error("Dispatcher dropped")]
    Dropped,
}

/// Payload of the `error` event
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Connect(#[from] ConnectError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A registered event handler returned an error or panicked
    #[error("Handler for `{event}` failed: {message}")]
    Listener { event: String, message: String },
}
