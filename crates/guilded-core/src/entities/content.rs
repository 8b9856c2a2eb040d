//! Long-form channel content - forum topics, docs, announcements and their replies

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::entities::Member;
use crate::error::{DomainError, DomainResult, EntityKind};
use crate::payload::{get_i64, get_str, get_time};
use crate::value_objects::{ContentId, ContentKind};

/// A forum topic, doc or announcement
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelContent {
    pub kind: ContentKind,
    pub id: ContentId,
    pub channel_id: String,
    pub team_id: String,
    pub title: Option<String>,
    pub body: Value,
    pub author_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
    /// Set when the content is published through a delete event
    pub deleted_by: Option<Member>,
}

impl ChannelContent {
    /// Build content of `kind` from the object stored under `kind.payload_key()`
    pub fn from_payload(
        kind: ContentKind,
        data: &Value,
        channel_id: &str,
        team_id: &str,
    ) -> DomainResult<Self> {
        let id = data
            .get("id")
            .and_then(|id| kind.parse_id(id))
            .ok_or(DomainError::MissingField {
                kind: EntityKind::Content,
                field: "id",
            })?;

        Ok(Self {
            kind,
            id,
            channel_id: get_str(data, "channelId").unwrap_or_else(|| channel_id.to_string()),
            team_id: get_str(data, "teamId").unwrap_or_else(|| team_id.to_string()),
            title: get_str(data, "title"),
            body: data.get(kind.body_key()).cloned().unwrap_or(Value::Null),
            author_id: get_str(data, "createdBy"),
            created_at: get_time(data, "createdAt"),
            edited_at: get_time(data, "editedAt").or_else(|| get_time(data, "updatedAt")),
            deleted_by: None,
        })
    }
}

/// A reply to a forum topic, doc or announcement
#[derive(Debug, Clone, PartialEq)]
pub struct ContentReply {
    pub kind: ContentKind,
    pub id: i64,
    pub parent_id: ContentId,
    pub channel_id: String,
    pub author_id: Option<String>,
    pub body: Value,
    pub created_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<Member>,
}

impl ContentReply {
    /// Build a reply from the `reply` object of `TEAM_CHANNEL_CONTENT_REPLY_CREATED`
    pub fn from_payload(
        kind: ContentKind,
        data: &Value,
        parent_id: ContentId,
        channel_id: &str,
    ) -> DomainResult<Self> {
        let id = get_i64(data, "id").ok_or(DomainError::MissingField {
            kind: EntityKind::Reply,
            field: "id",
        })?;
        let body = data
            .get("message")
            .or_else(|| data.get("content"))
            .cloned()
            .unwrap_or(Value::Null);

        Ok(Self {
            kind,
            id,
            parent_id,
            channel_id: channel_id.to_string(),
            author_id: get_str(data, "createdBy"),
            body,
            created_at: get_time(data, "createdAt"),
            deleted_by: None,
        })
    }
}
