//! Wire protocol
//!
//! Socket.IO-style text frames: numeric transport prefixes, a JSON handshake
//! frame, and `42`-prefixed application events.

pub mod close_codes;
mod frames;

pub use frames::{
    decode, DecodedEvent, FrameError, HelloFrame, InboundFrame, OutboundFrame, EVENT_PREFIX,
    HEARTBEAT, PONG,
};
