//! Gateway events
//!
//! Wire event kinds the router understands and the raw payload types it publishes.

mod event_types;
mod payloads;

pub use event_types::WireEventKind;
pub use payloads::{RawMessageDelete, RawPinEvent};
