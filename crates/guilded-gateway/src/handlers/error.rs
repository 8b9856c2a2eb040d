//! Handler error types

use guilded_cache::FetchError;
use guilded_core::DomainError;
use thiserror::Error;

/// Failure while translating one wire event
#[derive(Debug, Clone, Error)]
pub enum HandlerError {
    /// A required field is missing or has the wrong shape
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A lookup the event cannot do without failed
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub(crate) fn missing(field: &str) -> Self {
        Self::InvalidPayload(format!("missing {field}"))
    }
}

/// Handler result type
pub type HandlerResult<T> = Result<T, HandlerError>;
