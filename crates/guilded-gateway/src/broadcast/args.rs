//! Event arguments
//!
//! Every published event carries zero or more positional arguments.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use guilded_core::{Channel, ChannelContent, ContentId, ContentReply, Member, Message, Team, User};
use serde_json::Value;

use crate::error::GatewayError;
use crate::events::{RawMessageDelete, RawPinEvent};

/// Positional arguments of one event
pub type EventArgs = Vec<EventArg>;

/// One positional event argument
#[derive(Debug, Clone)]
pub enum EventArg {
    Message(Message),
    Member(Member),
    User(User),
    Team(Team),
    Channel(Channel),
    Content(ChannelContent),
    Reply(ContentReply),
    MessageDelete(RawMessageDelete),
    Pin(RawPinEvent),
    /// The wire payload, untouched
    Raw(Arc<Value>),
    Text(String),
    Id(String),
    ContentId(ContentId),
    Int(i64),
    Timestamp(DateTime<Utc>),
    CloseCode(Option<u16>),
    Error(Arc<GatewayError>),
}

impl EventArg {
    pub fn raw(data: &Value) -> Self {
        Self::Raw(Arc::new(data.clone()))
    }

    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(message) => Some(message),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            Self::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            Self::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    pub fn as_content(&self) -> Option<&ChannelContent> {
        match self {
            Self::Content(content) => Some(content),
            _ => None,
        }
    }

    pub fn as_reply(&self) -> Option<&ContentReply> {
        match self {
            Self::Reply(reply) => Some(reply),
            _ => None,
        }
    }

    /// String value of `Text` and `Id` arguments
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(text) | Self::Id(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_raw(&self) -> Option<&Value> {
        match self {
            Self::Raw(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_error(&self) -> Option<&GatewayError> {
        match self {
            Self::Error(err) => Some(err),
            _ => None,
        }
    }
}

/// What a resolved waiter receives: nothing, the single argument, or all of them
#[derive(Debug, Clone)]
pub enum WaitResult {
    None,
    Single(EventArg),
    Multiple(Vec<EventArg>),
}

impl WaitResult {
    pub fn from_args(mut args: EventArgs) -> Self {
        match args.len() {
            0 => Self::None,
            1 => args.pop().map_or(Self::None, Self::Single),
            _ => Self::Multiple(args),
        }
    }

    /// The single argument, if there was exactly one
    pub fn into_single(self) -> Option<EventArg> {
        match self {
            Self::Single(arg) => Some(arg),
            _ => None,
        }
    }

    /// All arguments regardless of arity
    pub fn into_vec(self) -> Vec<EventArg> {
        match self {
            Self::None => Vec::new(),
            Self::Single(arg) => vec![arg],
            Self::Multiple(args) => args,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}
