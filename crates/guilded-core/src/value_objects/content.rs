//! Channel content identifiers
//!
//! Forum topics and docs are keyed by integers, announcements by opaque strings.
//! Each kind keeps its own id type so deletion and reply paths never mix them up.

use std::fmt;

use serde_json::Value;

use crate::entities::ChannelKind;
use crate::payload::value_as_i64;

/// The kinds of long-form content a team channel can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentKind {
    ForumTopic,
    Doc,
    Announcement,
}

impl ContentKind {
    /// The content kind hosted by a channel, if any
    #[must_use]
    pub const fn for_channel(kind: ChannelKind) -> Option<Self> {
        match kind {
            ChannelKind::Forum => Some(Self::ForumTopic),
            ChannelKind::Doc => Some(Self::Doc),
            ChannelKind::Announcement => Some(Self::Announcement),
            _ => None,
        }
    }

    /// Event name stem, e.g. `forum_topic` in `forum_topic_create`
    #[must_use]
    pub const fn event_stem(self) -> &'static str {
        match self {
            Self::ForumTopic => "forum_topic",
            Self::Doc => "doc",
            Self::Announcement => "announcement",
        }
    }

    /// Reply event name stem, e.g. `forum_reply` in `forum_reply_create`
    #[must_use]
    pub const fn reply_stem(self) -> &'static str {
        match self {
            Self::ForumTopic => "forum_reply",
            Self::Doc => "doc_reply",
            Self::Announcement => "announcement_reply",
        }
    }

    /// Key holding the content object in `TEAM_CHANNEL_CONTENT_CREATED`
    #[must_use]
    pub const fn payload_key(self) -> &'static str {
        match self {
            Self::ForumTopic => "thread",
            Self::Doc => "doc",
            Self::Announcement => "announcement",
        }
    }

    /// Key holding the body of the content
    #[must_use]
    pub const fn body_key(self) -> &'static str {
        match self {
            Self::ForumTopic => "message",
            Self::Doc | Self::Announcement => "content",
        }
    }

    /// Parse a content id of this kind from a wire value
    pub fn parse_id(self, value: &Value) -> Option<ContentId> {
        match self {
            Self::ForumTopic | Self::Doc => value_as_i64(value).map(ContentId::Numeric),
            Self::Announcement => match value {
                Value::String(s) => Some(ContentId::Text(s.clone())),
                Value::Number(n) => Some(ContentId::Text(n.to_string())),
                _ => None,
            },
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_stem())
    }
}

/// Identifier of a forum topic, doc or announcement
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ContentId {
    Numeric(i64),
    Text(String),
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Numeric(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for ContentId {
    fn from(id: i64) -> Self {
        Self::Numeric(id)
    }
}

impl From<&str> for ContentId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}
