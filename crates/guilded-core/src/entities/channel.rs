//! Channel entity - team channels, threads and DM channels

use std::fmt;

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{DomainError, DomainResult, EntityKind};
use crate::payload::{first_str, get_str, get_time, unwrap_object};

/// Channel type as reported by `contentType`/`type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ChannelKind {
    #[default]
    Chat,
    Voice,
    Forum,
    Doc,
    Announcement,
    Thread,
    Dm,
    Stream,
    Media,
    List,
    Calendar,
    Scheduling,
    Unknown,
}

impl ChannelKind {
    /// Parse a wire channel type. Matching is case-insensitive; unknown values map to `Unknown`.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "chat" | "text" => Self::Chat,
            "voice" => Self::Voice,
            "forum" => Self::Forum,
            "doc" | "docs" => Self::Doc,
            "announcement" | "announcements" | "news" => Self::Announcement,
            "thread" | "temporal" => Self::Thread,
            "dm" => Self::Dm,
            "stream" => Self::Stream,
            "media" => Self::Media,
            "list" => Self::List,
            "event" | "calendar" => Self::Calendar,
            "scheduling" => Self::Scheduling,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Voice => "voice",
            Self::Forum => "forum",
            Self::Doc => "doc",
            Self::Announcement => "announcement",
            Self::Thread => "thread",
            Self::Dm => "dm",
            Self::Stream => "stream",
            Self::Media => "media",
            Self::List => "list",
            Self::Calendar => "calendar",
            Self::Scheduling => "scheduling",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub kind: ChannelKind,
    /// `None` for DM channels
    pub team_id: Option<String>,
    pub group_id: Option<String>,
    pub name: Option<String>,
    /// Parent channel for threads
    pub parent_id: Option<String>,
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl Channel {
    pub fn new(id: impl Into<String>, kind: ChannelKind, team_id: Option<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            team_id,
            group_id: None,
            name: None,
            parent_id: None,
            created_by: None,
            created_at: None,
        }
    }

    /// Build a channel from a payload (`{channel: {...}}` or the bare object).
    ///
    /// `team_id` is used when the payload itself does not name a team.
    pub fn from_payload(data: &Value, team_id: Option<&str>) -> DomainResult<Self> {
        let data = unwrap_object(data, "channel");
        let id = first_str(data, &["id", "channelId"]).ok_or(DomainError::MissingField {
            kind: EntityKind::Channel,
            field: "id",
        })?;

        let team_id = get_str(data, "teamId").or_else(|| team_id.map(str::to_string));
        let kind = match first_str(data, &["contentType", "type"]) {
            Some(kind) => ChannelKind::parse(&kind),
            None if team_id.is_none() => ChannelKind::Dm,
            None => ChannelKind::Unknown,
        };

        Ok(Self {
            id,
            kind,
            team_id,
            group_id: get_str(data, "groupId"),
            name: get_str(data, "name"),
            parent_id: first_str(data, &["parentChannelId", "originatingChannelId"]),
            created_by: get_str(data, "createdBy"),
            created_at: get_time(data, "createdAt"),
        })
    }

    /// Build a thread channel from a `TemporalChannelCreated` payload
    pub fn thread_from_payload(data: &Value, team_id: &str) -> DomainResult<Self> {
        let mut thread = Self::from_payload(data, Some(team_id))?;
        thread.kind = ChannelKind::Thread;
        Ok(thread)
    }

    #[inline]
    pub fn is_dm(&self) -> bool {
        self.team_id.is_none() || self.kind == ChannelKind::Dm
    }
}
