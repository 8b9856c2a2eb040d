//! Chat message events

use chrono::Utc;
use guilded_core::payload::{get_str, unwrap_object};
use guilded_core::Message;
use serde_json::Value;

use super::{require_str, HandlerError, HandlerResult, RouterContext};
use crate::broadcast::EventArg;
use crate::events::{RawMessageDelete, RawPinEvent};

/// Handles `ChatMessage*`, `ChatPinnedMessage*` and `ChatChannelTyping`
pub struct MessageHandler;

impl MessageHandler {
    /// `ChatMessageCreated`: cache the message and publish `message`
    pub async fn created(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let message = Message::from_payload(data)?;

        if let Err(e) = ctx
            .resolver
            .getch_channel(message.team_id.as_deref(), &message.channel_id)
            .await
        {
            tracing::debug!(
                channel_id = %message.channel_id,
                error = %e,
                "Channel unavailable, skipping message"
            );
            return Ok(());
        }

        // Warm the cache for the author of a DM
        if message.is_dm() {
            if let Some(author_id) = &message.author_id {
                if let Err(e) = ctx.resolver.getch_user(author_id).await {
                    tracing::debug!(user_id = %author_id, error = %e, "Author unavailable");
                }
            }
        }

        ctx.cache().insert_message(message.clone());
        ctx.dispatch("message", vec![EventArg::Message(message)]);
        Ok(())
    }

    /// `ChatMessageUpdated`: always `raw_message_edit`, `message_edit` when cached
    pub fn updated(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        ctx.dispatch("raw_message_edit", vec![EventArg::raw(data)]);

        let message_id = message_id(data)?;
        let Some(before) = ctx.cache().get_message(&message_id) else {
            return Ok(());
        };

        let after = Message::edited(&before, data)?;
        ctx.cache().insert_message(after.clone());
        ctx.dispatch(
            "message_edit",
            vec![EventArg::Message(before), EventArg::Message(after)],
        );
        Ok(())
    }

    /// `ChatMessageDeleted`: always `raw_message_delete`, `message_delete` when cached
    pub fn deleted(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let message_id = message_id(data)?;
        let cached = ctx.cache().get_message(&message_id);

        let raw = RawMessageDelete::from_payload(data, cached.clone())
            .ok_or_else(|| HandlerError::missing("message.id"))?;
        ctx.dispatch("raw_message_delete", vec![EventArg::MessageDelete(raw)]);

        if let Some(message) = cached {
            ctx.cache().remove_message(&message_id);
            ctx.dispatch("message_delete", vec![EventArg::Message(message)]);
        }
        Ok(())
    }

    /// `ChatChannelTyping`: `typing(channel_id, user_id, now)`
    pub fn typing(ctx: &RouterContext, data: &Value) -> HandlerResult<()> {
        let channel_id = require_str(data, "channelId")?;
        let user_id = require_str(data, "userId")?;

        ctx.dispatch(
            "typing",
            vec![
                EventArg::Id(channel_id),
                EventArg::Id(user_id),
                EventArg::Timestamp(Utc::now()),
            ],
        );
        Ok(())
    }

    /// `ChatPinnedMessageCreated` / `ChatPinnedMessageDeleted`
    pub fn pin_changed(ctx: &RouterContext, data: &Value, pinned: bool) -> HandlerResult<()> {
        let verb = if pinned { "pinned" } else { "unpinned" };
        let raw = RawPinEvent::from_payload(data).ok_or_else(|| HandlerError::missing("message.id"))?;

        let scope = if raw.in_team { "team" } else { "dm" };
        let message_id = raw.message_id.clone();
        ctx.dispatch(&format!("raw_{scope}_message_{verb}"), vec![EventArg::Pin(raw)]);

        let Some(message) = ctx.cache().get_message(&message_id) else {
            return Ok(());
        };
        let scope = if message.is_dm() { "dm" } else { "team" };
        ctx.dispatch(&format!("{scope}_message_{verb}"), vec![EventArg::Message(message)]);
        Ok(())
    }
}

fn message_id(data: &Value) -> HandlerResult<String> {
    get_str(unwrap_object(data, "message"), "id").ok_or_else(|| HandlerError::missing("message.id"))
}
