//! Forum topic, doc and announcement events
//!
//! Each content kind is resolved from the hosting channel's type and keeps its
//! own id type, cache entries and event names.

use guilded_core::payload::{get_bool, get_i64, get_str};
use guilded_core::{Channel, ChannelContent, ContentId, ContentKind, ContentReply, Member};
use serde_json::Value;

use super::{require_str, HandlerError, HandlerResult, RouterContext};
use crate::broadcast::EventArg;

/// Handles the `TEAM_CHANNEL_CONTENT_*` events
pub struct ContentHandler;

/// The channel a content event refers to, with the kind of content it hosts
struct ContentTarget {
    team_id: String,
    channel: Channel,
    kind: ContentKind,
}

impl ContentTarget {
    fn parse_id(&self, data: &Value, key: &'static str) -> HandlerResult<ContentId> {
        data.get(key)
            .and_then(|value| self.kind.parse_id(value))
            .ok_or_else(|| HandlerError::missing(key))
    }
}

impl ContentHandler {
    /// `TEAM_CHANNEL_CONTENT_CREATED`: `<kind>_create`, or `<kind>_move` for moved content
    pub async fn created(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let Some(target) = Self::resolve_target(ctx, data).await? else {
            return Ok(());
        };

        let key = target.kind.payload_key();
        let object = data.get(key).ok_or_else(|| HandlerError::missing(key))?;
        let content =
            ChannelContent::from_payload(target.kind, object, &target.channel.id, &target.team_id)?;
        ctx.cache().insert_content(content.clone());

        let stem = target.kind.event_stem();
        let event = match target.kind {
            // Announcements cannot be moved
            ContentKind::Announcement => format!("{stem}_create"),
            _ if get_bool(data, "contentMoved") => format!("{stem}_move"),
            _ => format!("{stem}_create"),
        };
        ctx.dispatch(&event, vec![EventArg::Content(content)]);
        Ok(())
    }

    /// `TEAM_CHANNEL_CONTENT_DELETED`: always `raw_<kind>_delete`, `<kind>_delete` when cached
    pub async fn deleted(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let Some(target) = Self::resolve_target(ctx, data).await? else {
            return Ok(());
        };
        let deleted_by = Self::deleted_by(ctx, &target.team_id, data).await;
        let content_id = target.parse_id(data, "contentId")?;

        let stem = target.kind.event_stem();
        ctx.dispatch(
            &format!("raw_{stem}_delete"),
            vec![
                EventArg::Channel(target.channel.clone()),
                EventArg::ContentId(content_id.clone()),
            ],
        );

        if let Some(mut content) =
            ctx.cache()
                .remove_content(&target.channel.id, target.kind, &content_id)
        {
            content.deleted_by = deleted_by;
            ctx.dispatch(&format!("{stem}_delete"), vec![EventArg::Content(content)]);
        }
        Ok(())
    }

    /// `TEAM_CHANNEL_CONTENT_REPLY_CREATED`: `<kind>_reply_create` once the parent resolves
    pub async fn reply_created(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let Some(target) = Self::resolve_target(ctx, data).await? else {
            return Ok(());
        };
        let parent_id = target.parse_id(data, "contentId")?;

        let parent = match ctx
            .resolver
            .getch_content(target.kind, &target.channel, &parent_id)
            .await
        {
            Ok(parent) => parent,
            Err(e) => {
                tracing::debug!(content_id = %parent_id, error = %e, "Parent content unavailable");
                return Ok(());
            }
        };

        let object = data.get("reply").ok_or_else(|| HandlerError::missing("reply"))?;
        let reply = ContentReply::from_payload(target.kind, object, parent.id, &target.channel.id)?;
        ctx.cache().insert_reply(reply.clone());

        let stem = target.kind.reply_stem();
        ctx.dispatch(&format!("{stem}_create"), vec![EventArg::Reply(reply)]);
        Ok(())
    }

    /// `TEAM_CHANNEL_CONTENT_REPLY_DELETED`: always `raw_<kind>_reply_delete`,
    /// `<kind>_reply_delete` when the reply is cached
    pub async fn reply_deleted(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let Some(target) = Self::resolve_target(ctx, data).await? else {
            return Ok(());
        };
        let deleted_by = Self::deleted_by(ctx, &target.team_id, data).await;
        let parent_id = target.parse_id(data, "contentId")?;
        let reply_id =
            get_i64(data, "contentReplyId").ok_or_else(|| HandlerError::missing("contentReplyId"))?;

        let stem = target.kind.reply_stem();
        ctx.dispatch(
            &format!("raw_{stem}_delete"),
            vec![
                EventArg::Channel(target.channel.clone()),
                EventArg::ContentId(parent_id.clone()),
                EventArg::Int(reply_id),
            ],
        );

        if let Err(e) = ctx
            .resolver
            .getch_content(target.kind, &target.channel, &parent_id)
            .await
        {
            tracing::debug!(content_id = %parent_id, error = %e, "Parent content unavailable");
            return Ok(());
        }

        if let Some(mut reply) =
            ctx.cache()
                .remove_reply(&target.channel.id, target.kind, &parent_id, reply_id)
        {
            reply.deleted_by = deleted_by;
            ctx.dispatch(&format!("{stem}_delete"), vec![EventArg::Reply(reply)]);
        }
        Ok(())
    }

    /// Resolve the team and channel of a content event.
    ///
    /// `None` when either cannot be resolved or the channel hosts no content.
    async fn resolve_target(
        ctx: &RouterContext,
        data: &Value,
    ) -> HandlerResult<Option<ContentTarget>> {
        let team_id = require_str(data, "teamId")?;
        let channel_id = require_str(data, "channelId")?;

        if let Err(e) = ctx.resolver.getch_team(&team_id).await {
            tracing::debug!(team_id = %team_id, error = %e, "Team unavailable, skipping content event");
            return Ok(None);
        }
        let channel = match ctx.resolver.getch_channel(Some(&team_id), &channel_id).await {
            Ok(channel) => channel,
            Err(e) => {
                tracing::debug!(channel_id = %channel_id, error = %e, "Channel unavailable");
                return Ok(None);
            }
        };

        let Some(kind) = ContentKind::for_channel(channel.kind) else {
            tracing::debug!(
                channel_id = %channel_id,
                channel_kind = channel.kind.as_str(),
                "Content event for a channel without content"
            );
            return Ok(None);
        };

        Ok(Some(ContentTarget {
            team_id,
            channel,
            kind,
        }))
    }

    async fn deleted_by(ctx: &RouterContext, team_id: &str, data: &Value) -> Option<Member> {
        let user_id = get_str(data, "deletedBy")?;
        ctx.resolver.getch_member(team_id, &user_id).await.ok()
    }
}
