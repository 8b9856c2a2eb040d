//! Member entity - a user's membership in a team

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::entities::User;
use crate::error::DomainResult;
use crate::payload::{get_i64, get_str, get_time, unwrap_object, value_as_i64};

/// Team member entity (a `User` plus team-scoped state)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub team_id: String,
    pub user: User,
    pub nickname: Option<String>,
    pub xp: i64,
    pub role_ids: Vec<i64>,
    pub joined_at: Option<DateTime<Utc>>,
}

impl Member {
    pub fn new(team_id: impl Into<String>, user: User) -> Self {
        Self {
            team_id: team_id.into(),
            user,
            nickname: None,
            xp: 0,
            role_ids: Vec::new(),
            joined_at: None,
        }
    }

    /// Build a member from a payload. The user fields may be nested under `user`.
    pub fn from_payload(team_id: &str, data: &Value) -> DomainResult<Self> {
        let user = User::from_payload(data)?;
        let outer = data;
        let inner = unwrap_object(data, "user");

        let role_ids = outer
            .get("roleIds")
            .or_else(|| inner.get("roleIds"))
            .and_then(Value::as_array)
            .map(|ids| ids.iter().filter_map(value_as_i64).collect())
            .unwrap_or_default();

        Ok(Self {
            team_id: get_str(outer, "teamId").unwrap_or_else(|| team_id.to_string()),
            user,
            nickname: get_str(outer, "nickname").or_else(|| get_str(inner, "nickname")),
            xp: get_i64(outer, "teamXp").or_else(|| get_i64(inner, "teamXp")).unwrap_or(0),
            role_ids,
            joined_at: get_time(outer, "joinDate").or_else(|| get_time(inner, "joinDate")),
        })
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.user.id
    }

    /// Nickname if set, otherwise the account name
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.name)
    }

    #[inline]
    pub fn has_role(&self, role_id: i64) -> bool {
        self.role_ids.contains(&role_id)
    }

    /// Apply a `userInfo` object from `TeamMemberUpdated`.
    ///
    /// Unknown keys are ignored. Returns whether any field changed.
    pub fn apply_user_info(&mut self, info: &Map<String, Value>) -> bool {
        let mut changed = false;
        for (key, value) in info {
            match key.as_str() {
                "nickname" => {
                    let nickname = value.as_str().map(str::to_string);
                    changed |= self.nickname != nickname;
                    self.nickname = nickname;
                }
                "name" => {
                    if let Some(name) = value.as_str() {
                        changed |= self.user.name != name;
                        self.user.name = name.to_string();
                    }
                }
                "profilePicture" | "avatar" => {
                    let avatar = value.as_str().map(str::to_string);
                    changed |= self.user.avatar != avatar;
                    self.user.avatar = avatar;
                }
                "teamXp" | "xp" => {
                    if let Some(xp) = value_as_i64(value) {
                        changed |= self.xp != xp;
                        self.xp = xp;
                    }
                }
                "roleIds" => {
                    if let Some(ids) = value.as_array() {
                        let role_ids: Vec<i64> = ids.iter().filter_map(value_as_i64).collect();
                        changed |= self.role_ids != role_ids;
                        self.role_ids = role_ids;
                    }
                }
                _ => {}
            }
        }
        changed
    }

    /// Set the member's roles (replaces all existing roles)
    pub fn set_roles(&mut self, role_ids: Vec<i64>) {
        self.role_ids = role_ids;
    }
}
