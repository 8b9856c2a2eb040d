//! Channel events

use guilded_core::payload::get_str;
use guilded_core::Channel;
use serde_json::Value;

use super::{require_str, HandlerResult, RouterContext};
use crate::broadcast::EventArg;

/// Handles `ChatChannelHidden` and `TemporalChannelCreated`
pub struct ChannelHandler;

impl ChannelHandler {
    /// `ChatChannelHidden`: publish `dm_channel_hide` for a cached DM, then evict it
    pub fn hidden(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let channel_id = require_str(data, "channelId")?;
        if let Some(channel) = ctx.cache().get_dm_channel(&channel_id) {
            ctx.dispatch("dm_channel_hide", vec![EventArg::Channel(channel)]);
            ctx.cache().remove_dm_channel(&channel_id);
        }
        Ok(())
    }

    /// `TemporalChannelCreated`: publish `team_thread_created` for team threads
    pub async fn thread_created(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let in_team = get_str(data, "channelType").is_some_and(|t| t.eq_ignore_ascii_case("team"));
        if !in_team {
            return Ok(());
        }

        let team_id = require_str(data, "teamId")?;
        if let Err(e) = ctx.resolver.getch_team(&team_id).await {
            tracing::debug!(team_id = %team_id, error = %e, "Team unavailable, skipping thread");
            return Ok(());
        }

        let thread = Channel::thread_from_payload(data, &team_id)?;
        ctx.cache().insert_channel(thread.clone());
        ctx.dispatch("team_thread_created", vec![EventArg::Channel(thread)]);
        Ok(())
    }
}
