//! User entity - a Guilded account

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{DomainError, DomainResult, EntityKind};
use crate::payload::{get_bool, get_i64, get_str, get_time, unwrap_object};
use crate::value_objects::Presence;

/// User entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub name: String,
    pub subdomain: Option<String>,
    pub avatar: Option<String>,
    pub bot: bool,
    pub presence: Option<Presence>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subdomain: None,
            avatar: None,
            bot: false,
            presence: None,
            created_at: None,
        }
    }

    /// Build a user from a payload (`{user: {...}}` or the bare object)
    pub fn from_payload(data: &Value) -> DomainResult<Self> {
        let data = unwrap_object(data, "user");
        let id = get_str(data, "id").ok_or(DomainError::MissingField {
            kind: EntityKind::User,
            field: "id",
        })?;

        Ok(Self {
            id,
            name: get_str(data, "name").unwrap_or_default(),
            subdomain: get_str(data, "subdomain"),
            avatar: get_str(data, "profilePicture").or_else(|| get_str(data, "avatar")),
            bot: get_bool(data, "bot"),
            presence: get_i64(data, "userPresenceStatus").and_then(Presence::from_value),
            created_at: get_time(data, "createdAt").or_else(|| get_time(data, "joinDate")),
        })
    }

    /// Mention syntax for this user
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }

    /// Profile URL, if the user has claimed a subdomain
    pub fn profile_url(&self) -> Option<String> {
        self.subdomain
            .as_ref()
            .map(|subdomain| format!("https://guilded.gg/{subdomain}"))
    }
}
