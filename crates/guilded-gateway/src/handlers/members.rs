//! Team member and user events

use guilded_core::payload::{get_i64, get_str, value_as_i64};
use guilded_core::{Member, Presence};
use serde_json::Value;

use super::{require_str, HandlerError, HandlerResult, RouterContext};
use crate::broadcast::EventArg;

/// Handles `TeamXpSet`, `TeamMember*`, `teamRolesUpdated` and the user presence event
pub struct MemberHandler;

impl MemberHandler {
    /// `TeamXpSet`
    pub fn xp_set(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let amount = match get_i64(data, "amount") {
            Some(amount) if amount != 0 => amount,
            _ => return Ok(()),
        };
        let team_id = require_str(data, "teamId")?;
        if ctx.cache().get_team(&team_id).is_none() {
            return Ok(());
        }

        let user_id = data
            .get("userIds")
            .and_then(Value::as_array)
            .and_then(|ids| ids.first())
            .and_then(|id| id.as_str().map(str::to_string))
            .or_else(|| get_str(data, "userId"))
            .ok_or_else(|| HandlerError::missing("userId"))?;

        Self::update_cached(ctx, &team_id, &user_id, |member| member.xp = amount);
        Ok(())
    }

    /// `TeamMemberUpdated`: always `raw_member_update`, `member_update` when cached
    pub fn updated(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        ctx.dispatch("raw_member_update", vec![EventArg::raw(data)]);

        let team_id = require_str(data, "teamId")?;
        if ctx.cache().get_team(&team_id).is_none() {
            return Ok(());
        }
        // Bulk updates carry `userIds` instead and are not translated
        let Some(user_id) = get_str(data, "userId") else {
            return Ok(());
        };
        let Some(info) = data.get("userInfo").and_then(Value::as_object) else {
            return Ok(());
        };

        Self::update_cached(ctx, &team_id, &user_id, |member| {
            member.apply_user_info(info);
        });
        Ok(())
    }

    /// `teamRolesUpdated`: one `member_update` per cached member in `memberRoleIds`
    pub async fn roles_updated(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let team_id = require_str(data, "teamId")?;
        if let Err(e) = ctx.resolver.getch_team(&team_id).await {
            tracing::debug!(team_id = %team_id, error = %e, "Team unavailable, skipping roles update");
            return Ok(());
        }

        let updates = data
            .get("memberRoleIds")
            .and_then(Value::as_array)
            .ok_or_else(|| HandlerError::missing("memberRoleIds"))?;

        for update in updates {
            let Some(user_id) = get_str(update, "userId") else {
                continue;
            };
            let role_ids: Vec<i64> = update
                .get("roleIds")
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(value_as_i64).collect())
                .unwrap_or_default();

            Self::update_cached(ctx, &team_id, &user_id, move |member| member.set_roles(role_ids));
        }
        Ok(())
    }

    /// `TeamMemberJoined`
    pub async fn joined(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let team_id = require_str(data, "teamId")?;
        let user = data.get("user").ok_or_else(|| HandlerError::missing("user"))?;

        // The member is published even if the team cannot be resolved
        if let Err(e) = ctx.resolver.getch_team(&team_id).await {
            tracing::debug!(team_id = %team_id, error = %e, "Team unavailable for joined member");
        }

        let member = Member::from_payload(&team_id, user)?;
        ctx.cache().insert_member(member.clone());
        ctx.dispatch("member_join", vec![EventArg::Member(member)]);
        Ok(())
    }

    /// `TeamMemberRemoved`: evict, `raw_member_remove`, then `member_remove` when cached
    pub fn removed(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let team_id = require_str(data, "teamId")?;
        let user_id = require_str(data, "userId")?;

        let removed = ctx.cache().remove_member(&team_id, &user_id);
        ctx.dispatch(
            "raw_member_remove",
            vec![EventArg::Id(team_id), EventArg::Id(user_id)],
        );
        if let Some(member) = removed {
            ctx.dispatch("member_remove", vec![EventArg::Member(member)]);
        }
        Ok(())
    }

    /// `USER_PRESENCE_MANUALLY_SET`: the client user changed their own status
    pub fn presence_set(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let status = get_i64(data, "status").unwrap_or(1);
        let presence = Presence::from_value(status)
            .ok_or_else(|| HandlerError::InvalidPayload(format!("unknown presence status {status}")))?;

        tracing::debug!(presence = %presence, "Client presence set");
        ctx.cache().set_client_presence(presence);
        Ok(())
    }

    /// Apply `change` to a cached member and publish `member_update(before, after)`
    fn update_cached(
        ctx: &RouterContext,
        team_id: &str,
        user_id: &str,
        change: impl FnOnce(&mut Member),
    ) {
        let Some(before) = ctx.cache().get_member(team_id, user_id) else {
            return;
        };

        let mut after = before.clone();
        change(&mut after);
        ctx.cache().insert_member(after.clone());
        ctx.dispatch(
            "member_update",
            vec![EventArg::Member(before), EventArg::Member(after)],
        );
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{event, router};
    use super::super::EventRouter;
    use guilded_core::{Member, Presence, Team, User};
    use serde_json::json;
    use std::time::Duration;

    const WAIT: Option<Duration> = Some(Duration::from_secs(1));

    fn with_member() -> EventRouter {
        let router = router();
        router.cache().insert_team(Team::new("t1", "Team"));
        router
            .cache()
            .insert_member(Member::new("t1", User::new("u1", "alice")));
        router
    }

    #[tokio::test]
    async fn test_xp_set() {
        let router = with_member();
        let update = router.dispatcher().wait_for("member_update", WAIT);

        router
            .route(&event("TeamXpSet", json!({"teamId": "t1", "userIds": ["u1"], "amount": 50})))
            .await
            .unwrap();

        let args = update.await.unwrap().into_vec();
        assert_eq!(args[0].as_member().unwrap().xp, 0);
        assert_eq!(args[1].as_member().unwrap().xp, 50);
        assert_eq!(router.cache().get_member("t1", "u1").unwrap().xp, 50);
    }

    #[tokio::test]
    async fn test_xp_set_zero_amount_ignored() {
        let router = with_member();
        router
            .route(&event("TeamXpSet", json!({"teamId": "t1", "userId": "u1", "amount": 0})))
            .await
            .unwrap();
        assert_eq!(router.cache().get_member("t1", "u1").unwrap().xp, 0);
    }

    #[tokio::test]
    async fn test_member_updated_applies_user_info() {
        let router = with_member();
        let raw = router.dispatcher().wait_for("raw_member_update", WAIT);
        let update = router.dispatcher().wait_for("member_update", WAIT);

        let data = json!({"teamId": "t1", "userId": "u1", "userInfo": {"nickname": "ally"}});
        router.route(&event("TeamMemberUpdated", data)).await.unwrap();

        assert!(raw.await.is_ok());
        let args = update.await.unwrap().into_vec();
        assert_eq!(args[1].as_member().unwrap().display_name(), "ally");
    }

    #[tokio::test]
    async fn test_roles_updated() {
        let router = with_member();
        let update = router.dispatcher().wait_for("member_update", WAIT);

        let data = json!({
            "teamId": "t1",
            "memberRoleIds": [
                {"userId": "u1", "roleIds": [3, 4]},
                {"userId": "uncached", "roleIds": [1]}
            ]
        });
        router.route(&event("teamRolesUpdated", data)).await.unwrap();

        let args = update.await.unwrap().into_vec();
        assert!(args[1].as_member().unwrap().has_role(4));
        assert!(router.cache().get_member("t1", "uncached").is_none());
    }

    #[tokio::test]
    async fn test_member_joined() {
        let router = router();
        let joined = router.dispatcher().wait_for("member_join", WAIT);

        let data = json!({"teamId": "t1", "user": {"id": "u2", "name": "bob"}});
        router.route(&event("TeamMemberJoined", data)).await.unwrap();

        let arg = joined.await.unwrap().into_single().unwrap();
        assert_eq!(arg.as_member().unwrap().id(), "u2");
        assert!(router.cache().get_member("t1", "u2").is_some());
    }

    #[tokio::test]
    async fn test_member_removed() {
        let router = with_member();
        let raw = router.dispatcher().wait_for("raw_member_remove", WAIT);
        let removed = router.dispatcher().wait_for("member_remove", WAIT);

        router
            .route(&event("TeamMemberRemoved", json!({"teamId": "t1", "userId": "u1"})))
            .await
            .unwrap();

        assert_eq!(raw.await.unwrap().into_vec().len(), 2);
        assert_eq!(removed.await.unwrap().into_single().unwrap().as_member().unwrap().id(), "u1");
        assert!(router.cache().get_member("t1", "u1").is_none());
    }

    #[tokio::test]
    async fn test_presence_set_defaults_to_online() {
        let router = router();
        router
            .route(&event("USER_PRESENCE_MANUALLY_SET", json!({})))
            .await
            .unwrap();
        assert_eq!(router.cache().client_presence(), Some(Presence::Online));

        router
            .route(&event("USER_PRESENCE_MANUALLY_SET", json!({"status": 3})))
            .await
            .unwrap();
        assert_eq!(router.cache().client_presence(), Some(Presence::DoNotDisturb));
    }
}
