//! Message entity - a chat message in a team or DM channel

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{DomainError, DomainResult, EntityKind};
use crate::payload::{first_str, get_str, get_time};

/// Chat message entity.
///
/// `content` is kept as the raw rich-text document; rendering it is left to callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    /// `None` for DM messages
    pub team_id: Option<String>,
    pub author_id: Option<String>,
    pub webhook_id: Option<String>,
    pub content: Value,
    pub created_at: Option<DateTime<Utc>>,
    pub edited_at: Option<DateTime<Utc>>,
}

impl Message {
    /// Build a message from a `ChatMessageCreated`/`ChatMessageUpdated` payload.
    ///
    /// Fields may live at the top level or inside the nested `message` object.
    pub fn from_payload(data: &Value) -> DomainResult<Self> {
        let inner = data.get("message").unwrap_or(&Value::Null);
        let lookup = |keys: &[&str]| first_str(data, keys).or_else(|| first_str(inner, keys));

        let id = get_str(inner, "id")
            .or_else(|| get_str(data, "contentId"))
            .ok_or(DomainError::MissingField {
                kind: EntityKind::Message,
                field: "id",
            })?;
        let channel_id = lookup(&["channelId"]).ok_or(DomainError::MissingField {
            kind: EntityKind::Message,
            field: "channelId",
        })?;

        Ok(Self {
            id,
            channel_id,
            team_id: lookup(&["teamId", "serverId"]),
            author_id: lookup(&["createdBy"]),
            webhook_id: lookup(&["webhookId", "createdByWebhookId"]),
            content: inner.get("content").cloned().unwrap_or(Value::Null),
            created_at: get_time(inner, "createdAt").or_else(|| get_time(data, "createdAt")),
            edited_at: get_time(inner, "editedAt").or_else(|| get_time(data, "updatedAt")),
        })
    }

    /// Build the post-edit message from a `ChatMessageUpdated` payload.
    ///
    /// The edit payload omits the webhook, creation time and sometimes the channel and author,
    /// so those are carried over from the cached message.
    pub fn edited(before: &Self, data: &Value) -> DomainResult<Self> {
        let inner = data.get("message").unwrap_or(&Value::Null);
        let mut after = match Self::from_payload(data) {
            Ok(after) => after,
            Err(DomainError::MissingField { .. }) => Self {
                content: inner.get("content").cloned().unwrap_or(Value::Null),
                edited_at: get_time(inner, "editedAt"),
                ..before.clone()
            },
            Err(e) => return Err(e),
        };

        after.webhook_id = before.webhook_id.clone();
        after.created_at = before.created_at;
        after.author_id = after.author_id.or_else(|| before.author_id.clone());
        after.team_id = after.team_id.or_else(|| before.team_id.clone());
        if after.edited_at.is_none() {
            after.edited_at = Some(Utc::now());
        }
        Ok(after)
    }

    #[inline]
    pub fn is_dm(&self) -> bool {
        self.team_id.is_none()
    }
}
