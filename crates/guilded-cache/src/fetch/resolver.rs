//! Get-or-fetch resolution
//!
//! Cache hit first; on a miss, fetch and insert the result so the next
//! lookup is served from the cache.

use std::sync::Arc;

use guilded_core::{Channel, ChannelContent, ContentId, ContentKind, Member, Team, User};

use super::{EntityFetcher, FetchResult};
use crate::store::SharedCacheStore;

/// Resolves entities through the cache with a fetcher fallback
#[derive(Clone)]
pub struct Resolver {
    cache: SharedCacheStore,
    fetcher: Arc<dyn EntityFetcher>,
}

impl Resolver {
    pub fn new(cache: SharedCacheStore, fetcher: Arc<dyn EntityFetcher>) -> Self {
        Self { cache, fetcher }
    }

    /// The cache this resolver reads and populates
    pub fn cache(&self) -> &SharedCacheStore {
        &self.cache
    }

    pub async fn getch_team(&self, team_id: &str) -> FetchResult<Team> {
        if let Some(team) = self.cache.get_team(team_id) {
            return Ok(team);
        }

        let team = self.fetcher.fetch_team(team_id).await?;
        tracing::debug!(team_id = %team_id, "Fetched uncached team");
        self.cache.insert_team(team.clone());
        Ok(team)
    }

    pub async fn getch_channel(&self, team_id: Option<&str>, channel_id: &str) -> FetchResult<Channel> {
        if let Some(channel) = self.cache.get_channel(channel_id) {
            return Ok(channel);
        }

        let channel = self.fetcher.fetch_channel(team_id, channel_id).await?;
        tracing::debug!(channel_id = %channel_id, "Fetched uncached channel");
        self.cache.insert_channel(channel.clone());
        Ok(channel)
    }

    pub async fn getch_user(&self, user_id: &str) -> FetchResult<User> {
        if let Some(user) = self.cache.get_user(user_id) {
            return Ok(user);
        }

        let user = self.fetcher.fetch_user(user_id).await?;
        self.cache.insert_user(user.clone());
        Ok(user)
    }

    pub async fn getch_member(&self, team_id: &str, user_id: &str) -> FetchResult<Member> {
        if let Some(member) = self.cache.get_member(team_id, user_id) {
            return Ok(member);
        }

        let member = self.fetcher.fetch_member(team_id, user_id).await?;
        self.cache.insert_member(member.clone());
        Ok(member)
    }

    pub async fn getch_content(
        &self,
        kind: ContentKind,
        channel: &Channel,
        content_id: &ContentId,
    ) -> FetchResult<ChannelContent> {
        if let Some(content) = self.cache.get_content(&channel.id, kind, content_id) {
            return Ok(content);
        }

        let content = self.fetcher.fetch_content(kind, channel, content_id).await?;
        self.cache.insert_content(content.clone());
        Ok(content)
    }
}

impl std::fmt::Debug for Resolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Resolver")
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}
