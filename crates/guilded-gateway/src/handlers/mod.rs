//! Event router
//!
//! Translates decoded wire events into cache updates and published events.

mod channels;
mod content;
mod error;
mod members;
mod messages;

pub use channels::ChannelHandler;
pub use content::ContentHandler;
pub use error::{HandlerError, HandlerResult};
pub use members::MemberHandler;
pub use messages::MessageHandler;

use std::sync::Arc;

use guilded_cache::{CacheStore, Resolver};
use guilded_core::payload::get_str;
use serde_json::Value;

use crate::broadcast::{Dispatcher, EventArg, EventArgs};
use crate::error::{GatewayError, ProtocolError};
use crate::events::WireEventKind;
use crate::protocol::DecodedEvent;

/// What every handler works with
pub struct RouterContext {
    pub resolver: Resolver,
    pub dispatcher: Dispatcher,
}

impl RouterContext {
    #[inline]
    pub fn cache(&self) -> &CacheStore {
        self.resolver.cache()
    }

    #[inline]
    pub fn dispatch(&self, event: &str, args: EventArgs) {
        self.dispatcher.dispatch(event, args);
    }
}

/// Read a required string field
pub(crate) fn require_str(data: &Value, key: &str) -> HandlerResult<String> {
    get_str(data, key).ok_or_else(|| HandlerError::missing(key))
}

/// Routes decoded events to their handlers
pub struct EventRouter {
    ctx: RouterContext,
}

impl EventRouter {
    pub fn new(resolver: Resolver, dispatcher: Dispatcher) -> Self {
        Self {
            ctx: RouterContext {
                resolver,
                dispatcher,
            },
        }
    }

    pub fn dispatcher(&self) -> &Dispatcher {
        &self.ctx.dispatcher
    }

    pub fn cache(&self) -> &CacheStore {
        self.ctx.cache()
    }

    /// Translate one decoded event.
    ///
    /// Unknown kinds are ignored. A failing translation is published as `error`
    /// and also returned to the caller.
    pub async fn route(&self, event: &DecodedEvent) -> Result<(), ProtocolError> {
        let Some(kind) = WireEventKind::from_str(&event.kind) else {
            tracing::trace!(event = %event.kind, "Ignoring unknown event kind");
            return Ok(());
        };

        let Err(source) = self.handle(kind, &event.payload).await else {
            return Ok(());
        };

        let err = ProtocolError {
            event: event.kind.clone(),
            source,
        };
        tracing::warn!(event = %event.kind, error = %err.source, "Event translation failed");
        self.ctx.dispatch(
            "error",
            vec![EventArg::Error(Arc::new(GatewayError::Protocol(err.clone())))],
        );
        Err(err)
    }

    async fn handle(&self, kind: WireEventKind, data: &Value) -> HandlerResult<()> {
        let ctx = &self.ctx;
        match kind {
            WireEventKind::ChatMessageCreated => MessageHandler::created(ctx, data).await,
            WireEventKind::ChatMessageUpdated => MessageHandler::updated(ctx, data),
            WireEventKind::ChatMessageDeleted => MessageHandler::deleted(ctx, data),
            WireEventKind::ChatChannelTyping => MessageHandler::typing(ctx, data),
            WireEventKind::ChatPinnedMessageCreated => MessageHandler::pin_changed(ctx, data, true),
            WireEventKind::ChatPinnedMessageDeleted => {
                MessageHandler::pin_changed(ctx, data, false)
            }
            WireEventKind::ChatChannelHidden => ChannelHandler::hidden(ctx, data),
            WireEventKind::TemporalChannelCreated => ChannelHandler::thread_created(ctx, data).await,
            WireEventKind::TeamXpSet => MemberHandler::xp_set(ctx, data),
            WireEventKind::TeamMemberUpdated => MemberHandler::updated(ctx, data),
            WireEventKind::TeamRolesUpdated => MemberHandler::roles_updated(ctx, data).await,
            WireEventKind::TeamMemberJoined => MemberHandler::joined(ctx, data).await,
            WireEventKind::TeamMemberRemoved => MemberHandler::removed(ctx, data),
            WireEventKind::UserUpdated => Ok(()),
            WireEventKind::UserPresenceManuallySet => MemberHandler::presence_set(ctx, data),
            WireEventKind::TeamChannelContentCreated => ContentHandler::created(ctx, data).await,
            WireEventKind::TeamChannelContentDeleted => ContentHandler::deleted(ctx, data).await,
            WireEventKind::TeamChannelContentReplyCreated => {
                ContentHandler::reply_created(ctx, data).await
            }
            WireEventKind::TeamChannelContentReplyDeleted => {
                ContentHandler::reply_deleted(ctx, data).await
            }
        }
    }
}
