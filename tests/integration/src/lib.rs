//! Integration test utilities for the gateway client
//!
//! Runs a fake gateway over real WebSockets on an ephemeral local port.

pub mod helpers;

pub use helpers::*;
