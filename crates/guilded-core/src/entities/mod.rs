//! Domain entities - objects the gateway keeps in the client cache

mod channel;
mod content;
mod member;
mod message;
mod team;
mod user;

pub use channel::{Channel, ChannelKind};
pub use content::{ChannelContent, ContentReply};
pub use member::Member;
pub use message::Message;
pub use team::Team;
pub use user::User;
