//! Entity fetcher trait

use async_trait::async_trait;
use guilded_core::{
    Channel, ChannelContent, ContentId, ContentKind, DomainError, EntityKind, Member, Team, User,
};

/// Error type for fetch operations
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: String },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }
}

impl From<DomainError> for FetchError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::NotFound { kind, id } => Self::NotFound { kind, id },
            other => Self::Decode(other.to_string()),
        }
    }
}

/// Result type for fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Source of entities that are not in the cache
///
/// Implementations typically call the REST API. Every method defaults to
/// `NotFound`, so a fetcher only overrides what it can actually serve.
#[async_trait]
pub trait EntityFetcher: Send + Sync {
    async fn fetch_team(&self, team_id: &str) -> FetchResult<Team> {
        Err(FetchError::not_found(EntityKind::Team, team_id))
    }

    /// `team_id` is `None` for DM channels
    async fn fetch_channel(&self, team_id: Option<&str>, channel_id: &str) -> FetchResult<Channel> {
        let _ = team_id;
        Err(FetchError::not_found(EntityKind::Channel, channel_id))
    }

    async fn fetch_user(&self, user_id: &str) -> FetchResult<User> {
        Err(FetchError::not_found(EntityKind::User, user_id))
    }

    async fn fetch_member(&self, team_id: &str, user_id: &str) -> FetchResult<Member> {
        let _ = team_id;
        Err(FetchError::not_found(EntityKind::Member, user_id))
    }

    async fn fetch_content(
        &self,
        kind: ContentKind,
        channel: &Channel,
        content_id: &ContentId,
    ) -> FetchResult<ChannelContent> {
        let _ = (kind, channel);
        Err(FetchError::not_found(EntityKind::Content, content_id.to_string()))
    }
}

/// Fetcher for cache-only operation; every lookup misses
#[derive(Debug, Clone, Copy, Default)]
pub struct NullFetcher;

#[async_trait]
impl EntityFetcher for NullFetcher {}
