//! Team entity - the group a per-team socket session is bound to

use chrono::{DateTime, Utc};
use serde_json::Value;

use crate::error::{DomainError, DomainResult, EntityKind};
use crate::payload::{get_bool, get_i64, get_str, get_time, unwrap_object};

/// Team entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub subdomain: Option<String>,
    pub owner_id: Option<String>,
    pub member_count: i64,
    pub public: bool,
    pub created_at: Option<DateTime<Utc>>,
}

impl Team {
    /// Create a team with only the identifying fields set
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            subdomain: None,
            owner_id: None,
            member_count: 0,
            public: false,
            created_at: None,
        }
    }

    /// Build a team from a REST or gateway payload (`{team: {...}}` or the bare object)
    pub fn from_payload(data: &Value) -> DomainResult<Self> {
        let data = unwrap_object(data, "team");
        let id = get_str(data, "id").ok_or(DomainError::MissingField {
            kind: EntityKind::Team,
            field: "id",
        })?;

        let member_count = get_i64(data, "memberCount")
            .or_else(|| data.get("measurements").and_then(|m| get_i64(m, "numMembers")))
            .unwrap_or(0);

        Ok(Self {
            id,
            name: get_str(data, "name").unwrap_or_default(),
            subdomain: get_str(data, "subdomain"),
            owner_id: get_str(data, "ownerId"),
            member_count,
            public: get_bool(data, "isPublic"),
            created_at: get_time(data, "createdAt"),
        })
    }

    /// Check if a user owns this team
    #[inline]
    pub fn is_owner(&self, user_id: &str) -> bool {
        self.owner_id.as_deref() == Some(user_id)
    }
}
