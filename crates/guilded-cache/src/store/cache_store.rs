//! Entity store
//!
//! Concurrent maps of every entity the gateway has observed. Writers are the
//! event router tasks; readers are application handlers and the client facade.

use std::sync::Arc;

use dashmap::DashMap;
use guilded_core::{
    Channel, ChannelContent, ContentId, ContentKind, ContentReply, Member, Message, Presence, Team,
    User,
};
use parking_lot::{Mutex, RwLock};

use super::MessageCache;

/// Cache configuration
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Bound on cached messages; `0` disables the message cache
    pub max_messages: usize,
}

impl Default for CacheOptions {
    fn default() -> Self {
        Self { max_messages: 1000 }
    }
}

impl From<&guilded_common::CacheConfig> for CacheOptions {
    fn from(config: &guilded_common::CacheConfig) -> Self {
        Self {
            max_messages: config.max_messages,
        }
    }
}

type ContentKey = (String, ContentKind, ContentId);
type ReplyKey = (String, ContentKind, ContentId, i64);

/// Shared handle to a cache store
pub type SharedCacheStore = Arc<CacheStore>;

/// The client-side entity cache
pub struct CacheStore {
    teams: DashMap<String, Team>,
    /// Team channels (including threads) by channel ID
    channels: DashMap<String, Channel>,
    dm_channels: DashMap<String, Channel>,
    users: DashMap<String, User>,
    /// Members by (team ID, user ID)
    members: DashMap<(String, String), Member>,
    messages: Mutex<MessageCache>,
    /// Forum topics, docs and announcements by (channel ID, kind, content ID)
    contents: DashMap<ContentKey, ChannelContent>,
    replies: DashMap<ReplyKey, ContentReply>,
    client_presence: RwLock<Option<Presence>>,
}

impl CacheStore {
    #[must_use]
    pub fn new(options: CacheOptions) -> Self {
        Self {
            teams: DashMap::new(),
            channels: DashMap::new(),
            dm_channels: DashMap::new(),
            users: DashMap::new(),
            members: DashMap::new(),
            messages: Mutex::new(MessageCache::new(options.max_messages)),
            contents: DashMap::new(),
            replies: DashMap::new(),
            client_presence: RwLock::new(None),
        }
    }

    /// Create a new cache store wrapped in Arc
    #[must_use]
    pub fn new_shared(options: CacheOptions) -> SharedCacheStore {
        Arc::new(Self::new(options))
    }

    // ---- teams ----

    pub fn insert_team(&self, team: Team) {
        self.teams.insert(team.id.clone(), team);
    }

    pub fn get_team(&self, team_id: &str) -> Option<Team> {
        self.teams.get(team_id).map(|r| r.clone())
    }

    /// Remove a team along with its channels and members
    pub fn remove_team(&self, team_id: &str) -> Option<Team> {
        let (_, team) = self.teams.remove(team_id)?;
        self.channels
            .retain(|_, channel| channel.team_id.as_deref() != Some(team_id));
        self.members.retain(|(team, _), _| team != team_id);
        Some(team)
    }

    pub fn teams(&self) -> Vec<Team> {
        self.teams.iter().map(|r| r.clone()).collect()
    }

    // ---- channels ----

    /// Insert a channel into the team or DM map depending on its kind
    pub fn insert_channel(&self, channel: Channel) {
        if channel.is_dm() {
            self.dm_channels.insert(channel.id.clone(), channel);
        } else {
            self.channels.insert(channel.id.clone(), channel);
        }
    }

    /// Look a channel up in the team map, then the DM map
    pub fn get_channel(&self, channel_id: &str) -> Option<Channel> {
        self.channels
            .get(channel_id)
            .map(|r| r.clone())
            .or_else(|| self.get_dm_channel(channel_id))
    }

    pub fn get_dm_channel(&self, channel_id: &str) -> Option<Channel> {
        self.dm_channels.get(channel_id).map(|r| r.clone())
    }

    pub fn remove_channel(&self, channel_id: &str) -> Option<Channel> {
        self.channels
            .remove(channel_id)
            .map(|(_, channel)| channel)
            .or_else(|| self.remove_dm_channel(channel_id))
    }

    pub fn remove_dm_channel(&self, channel_id: &str) -> Option<Channel> {
        self.dm_channels.remove(channel_id).map(|(_, channel)| channel)
    }

    pub fn team_channels(&self, team_id: &str) -> Vec<Channel> {
        self.channels
            .iter()
            .filter(|r| r.team_id.as_deref() == Some(team_id))
            .map(|r| r.clone())
            .collect()
    }

    // ---- users and members ----

    pub fn insert_user(&self, user: User) {
        self.users.insert(user.id.clone(), user);
    }

    pub fn get_user(&self, user_id: &str) -> Option<User> {
        self.users.get(user_id).map(|r| r.clone())
    }

    /// Insert a member; its user record is refreshed too
    pub fn insert_member(&self, member: Member) {
        self.insert_user(member.user.clone());
        self.members
            .insert((member.team_id.clone(), member.user.id.clone()), member);
    }

    pub fn get_member(&self, team_id: &str, user_id: &str) -> Option<Member> {
        self.members
            .get(&(team_id.to_string(), user_id.to_string()))
            .map(|r| r.clone())
    }

    pub fn remove_member(&self, team_id: &str, user_id: &str) -> Option<Member> {
        self.members
            .remove(&(team_id.to_string(), user_id.to_string()))
            .map(|(_, member)| member)
    }

    pub fn team_members(&self, team_id: &str) -> Vec<Member> {
        self.members
            .iter()
            .filter(|r| r.key().0 == team_id)
            .map(|r| r.clone())
            .collect()
    }

    // ---- messages ----

    pub fn insert_message(&self, message: Message) {
        if let Some(evicted) = self.messages.lock().insert(message) {
            tracing::trace!(message_id = %evicted.id, "Evicted oldest cached message");
        }
    }

    pub fn get_message(&self, message_id: &str) -> Option<Message> {
        self.messages.lock().get(message_id).cloned()
    }

    pub fn remove_message(&self, message_id: &str) -> Option<Message> {
        self.messages.lock().remove(message_id)
    }

    /// Snapshot of cached messages, oldest first
    pub fn cached_messages(&self) -> Vec<Message> {
        self.messages.lock().iter().cloned().collect()
    }

    pub fn message_count(&self) -> usize {
        self.messages.lock().len()
    }

    // ---- channel content ----

    pub fn insert_content(&self, content: ChannelContent) {
        let key = (content.channel_id.clone(), content.kind, content.id.clone());
        self.contents.insert(key, content);
    }

    pub fn get_content(
        &self,
        channel_id: &str,
        kind: ContentKind,
        content_id: &ContentId,
    ) -> Option<ChannelContent> {
        self.contents
            .get(&(channel_id.to_string(), kind, content_id.clone()))
            .map(|r| r.clone())
    }

    /// Remove content and every cached reply to it
    pub fn remove_content(
        &self,
        channel_id: &str,
        kind: ContentKind,
        content_id: &ContentId,
    ) -> Option<ChannelContent> {
        let removed = self
            .contents
            .remove(&(channel_id.to_string(), kind, content_id.clone()))
            .map(|(_, content)| content)?;
        self.replies.retain(|(channel, reply_kind, parent, _), _| {
            !(channel == channel_id && *reply_kind == kind && parent == content_id)
        });
        Some(removed)
    }

    pub fn insert_reply(&self, reply: ContentReply) {
        let key = (
            reply.channel_id.clone(),
            reply.kind,
            reply.parent_id.clone(),
            reply.id,
        );
        self.replies.insert(key, reply);
    }

    pub fn get_reply(
        &self,
        channel_id: &str,
        kind: ContentKind,
        parent_id: &ContentId,
        reply_id: i64,
    ) -> Option<ContentReply> {
        self.replies
            .get(&(channel_id.to_string(), kind, parent_id.clone(), reply_id))
            .map(|r| r.clone())
    }

    pub fn remove_reply(
        &self,
        channel_id: &str,
        kind: ContentKind,
        parent_id: &ContentId,
        reply_id: i64,
    ) -> Option<ContentReply> {
        self.replies
            .remove(&(channel_id.to_string(), kind, parent_id.clone(), reply_id))
            .map(|(_, reply)| reply)
    }

    // ---- client ----

    pub fn set_client_presence(&self, presence: Presence) {
        *self.client_presence.write() = Some(presence);
    }

    pub fn client_presence(&self) -> Option<Presence> {
        *self.client_presence.read()
    }

    /// Drop every cached entity
    pub fn clear(&self) {
        self.teams.clear();
        self.channels.clear();
        self.dm_channels.clear();
        self.users.clear();
        self.members.clear();
        self.messages.lock().clear();
        self.contents.clear();
        self.replies.clear();
        *self.client_presence.write() = None;
    }
}

impl Default for CacheStore {
    fn default() -> Self {
        Self::new(CacheOptions::default())
    }
}

impl std::fmt::Debug for CacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheStore")
            .field("teams", &self.teams.len())
            .field("channels", &self.channels.len())
            .field("dm_channels", &self.dm_channels.len())
            .field("users", &self.users.len())
            .field("members", &self.members.len())
            .field("messages", &self.message_count())
            .field("contents", &self.contents.len())
            .finish()
    }
}
