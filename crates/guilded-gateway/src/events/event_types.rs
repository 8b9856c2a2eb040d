//! Wire event types
//!
//! The `type` field of inbound application frames. Matching is case-sensitive;
//! kinds not listed here are ignored by the router.

use std::fmt;

/// Inbound gateway event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireEventKind {
    // Message events
    ChatMessageCreated,
    ChatMessageUpdated,
    ChatMessageDeleted,
    ChatPinnedMessageCreated,
    ChatPinnedMessageDeleted,
    ChatChannelTyping,

    // Channel events
    ChatChannelHidden,
    TemporalChannelCreated,

    // Member events
    TeamXpSet,
    TeamMemberUpdated,
    /// Sent as both `teamRolesUpdated` and `teamRolesUpdates`
    TeamRolesUpdated,
    TeamMemberJoined,
    TeamMemberRemoved,

    // User events
    UserUpdated,
    UserPresenceManuallySet,

    // Channel content events
    TeamChannelContentCreated,
    TeamChannelContentDeleted,
    TeamChannelContentReplyCreated,
    TeamChannelContentReplyDeleted,
}

impl WireEventKind {
    /// Get the canonical wire name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ChatMessageCreated => "ChatMessageCreated",
            Self::ChatMessageUpdated => "ChatMessageUpdated",
            Self::ChatMessageDeleted => "ChatMessageDeleted",
            Self::ChatPinnedMessageCreated => "ChatPinnedMessageCreated",
            Self::ChatPinnedMessageDeleted => "ChatPinnedMessageDeleted",
            Self::ChatChannelTyping => "ChatChannelTyping",
            Self::ChatChannelHidden => "ChatChannelHidden",
            Self::TemporalChannelCreated => "TemporalChannelCreated",
            Self::TeamXpSet => "TeamXpSet",
            Self::TeamMemberUpdated => "TeamMemberUpdated",
            Self::TeamRolesUpdated => "teamRolesUpdated",
            Self::TeamMemberJoined => "TeamMemberJoined",
            Self::TeamMemberRemoved => "TeamMemberRemoved",
            Self::UserUpdated => "USER_UPDATED",
            Self::UserPresenceManuallySet => "USER_PRESENCE_MANUALLY_SET",
            Self::TeamChannelContentCreated => "TEAM_CHANNEL_CONTENT_CREATED",
            Self::TeamChannelContentDeleted => "TEAM_CHANNEL_CONTENT_DELETED",
            Self::TeamChannelContentReplyCreated => "TEAM_CHANNEL_CONTENT_REPLY_CREATED",
            Self::TeamChannelContentReplyDeleted => "TEAM_CHANNEL_CONTENT_REPLY_DELETED",
        }
    }

    /// Parse a wire `type`
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "ChatMessageCreated" => Some(Self::ChatMessageCreated),
            "ChatMessageUpdated" => Some(Self::ChatMessageUpdated),
            "ChatMessageDeleted" => Some(Self::ChatMessageDeleted),
            "ChatPinnedMessageCreated" => Some(Self::ChatPinnedMessageCreated),
            "ChatPinnedMessageDeleted" => Some(Self::ChatPinnedMessageDeleted),
            "ChatChannelTyping" => Some(Self::ChatChannelTyping),
            "ChatChannelHidden" => Some(Self::ChatChannelHidden),
            "TemporalChannelCreated" => Some(Self::TemporalChannelCreated),
            "TeamXpSet" => Some(Self::TeamXpSet),
            "TeamMemberUpdated" => Some(Self::TeamMemberUpdated),
            "teamRolesUpdated" | "teamRolesUpdates" => Some(Self::TeamRolesUpdated),
            "TeamMemberJoined" => Some(Self::TeamMemberJoined),
            "TeamMemberRemoved" => Some(Self::TeamMemberRemoved),
            "USER_UPDATED" => Some(Self::UserUpdated),
            "USER_PRESENCE_MANUALLY_SET" => Some(Self::UserPresenceManuallySet),
            "TEAM_CHANNEL_CONTENT_CREATED" => Some(Self::TeamChannelContentCreated),
            "TEAM_CHANNEL_CONTENT_DELETED" => Some(Self::TeamChannelContentDeleted),
            "TEAM_CHANNEL_CONTENT_REPLY_CREATED" => Some(Self::TeamChannelContentReplyCreated),
            "TEAM_CHANNEL_CONTENT_REPLY_DELETED" => Some(Self::TeamChannelContentReplyDeleted),
            _ => None,
        }
    }
}

impl fmt::Display for WireEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
