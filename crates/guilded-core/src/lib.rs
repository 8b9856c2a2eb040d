//! # guilded-core
//!
//! Domain layer containing the entities the gateway translates wire events into,
//! the value objects they share, and the constructors that build them from raw payloads.
//! This crate has zero dependencies on infrastructure (sockets, caches, runtimes).

pub mod entities;
pub mod error;
pub mod payload;
pub mod value_objects;

// Re-export commonly used types at crate root
pub use entities::{
    Channel, ChannelContent, ChannelKind, ContentReply, Member, Message, Team, User,
};
pub use error::{DomainError, DomainResult, EntityKind};
pub use value_objects::{ContentId, ContentKind, Presence};
