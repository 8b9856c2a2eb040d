//! Gateway connections
//!
//! One `GatewaySession` per physical socket (the main gateway or one team),
//! each with its own heartbeat thread.

mod heartbeat;
mod registry;
mod session;
mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use heartbeat::{Heartbeat, LatencyGauge};
pub use registry::{SessionKey, SessionRegistry};
pub use session::{GatewaySession, SessionContext, SessionHandle};
pub use transport::{
    ConnectArgs, Connector, Transport, TransportError, TransportMessage, TungsteniteConnector,
    TungsteniteTransport,
};

pub(crate) use session::SessionCommand;
