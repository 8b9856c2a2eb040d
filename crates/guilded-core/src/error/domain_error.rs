//! Domain errors raised while building entities from gateway payloads

use std::fmt;

use thiserror::Error;

/// The kinds of entity the client caches and resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Team,
    Channel,
    User,
    Member,
    Message,
    Content,
    Reply,
}

impl EntityKind {
    /// Lower-case name used in logs and error messages
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Channel => "channel",
            Self::User => "user",
            Self::Member => "member",
            Self::Message => "message",
            Self::Content => "content",
            Self::Reply => "reply",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain layer errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Unknown {kind}: {id}")]
    NotFound { kind: EntityKind, id: String },

    #[error("Missing field `{field}` in {kind} payload")]
    MissingField { kind: EntityKind, field: &'static str },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl DomainError {
    /// Shorthand for a not-found error
    pub fn not_found(kind: EntityKind, id: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            id: id.into(),
        }
    }

    /// Get an error code string for logs and error events
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound { kind, .. } => match kind {
                EntityKind::Team => "UNKNOWN_TEAM",
                EntityKind::Channel => "UNKNOWN_CHANNEL",
                EntityKind::User => "UNKNOWN_USER",
                EntityKind::Member => "UNKNOWN_MEMBER",
                EntityKind::Message => "UNKNOWN_MESSAGE",
                EntityKind::Content => "UNKNOWN_CONTENT",
                EntityKind::Reply => "UNKNOWN_REPLY",
            },
            Self::MissingField { .. } => "MISSING_FIELD",
            Self::InvalidPayload(_) => "INVALID_PAYLOAD",
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Result type for entity construction
pub type DomainResult<T> = Result<T, DomainError>;
