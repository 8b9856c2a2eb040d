//! Event dispatch
//!
//! Publishes named events to persistent handlers and one-shot waiters.

mod args;
mod dispatcher;

pub use args::{EventArg, EventArgs, WaitResult};
pub use dispatcher::{Dispatcher, ListenerError, ListenerResult};
