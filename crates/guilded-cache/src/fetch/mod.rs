//! Network fallback for cache misses.
//!
//! The event router resolves referenced entities through [`Resolver`], which
//! prefers the cache and falls back to an [`EntityFetcher`].

mod fetcher;
mod resolver;

pub use fetcher::{EntityFetcher, FetchError, FetchResult, NullFetcher};
pub use resolver::Resolver;
