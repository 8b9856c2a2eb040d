//! # guilded-gateway
//!
//! Client side of the Guilded realtime gateway: socket sessions with heartbeats,
//! reconnect supervision, wire event translation, and the event dispatch hub.

pub mod broadcast;
pub mod client;
pub mod connection;
pub mod error;
pub mod events;
pub mod handlers;
pub mod protocol;
pub mod supervisor;

pub use broadcast::{Dispatcher, EventArg, EventArgs, ListenerError, ListenerResult, WaitResult};
pub use client::{Client, ClientBuilder};
pub use connection::{ConnectArgs, Connector, GatewaySession, TungsteniteConnector};
pub use error::{ConnectError, GatewayError, PollError, ProtocolError, WaitError};
pub use supervisor::{GatewayOptions, SessionSupervisor, SupervisorState};
