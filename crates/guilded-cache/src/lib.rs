//! # guilded-cache
//!
//! In-process cache of the entities the gateway has seen, plus the
//! get-or-fetch resolution the event router uses to look them up.
//!
//! ## Features
//!
//! - **Entity Store**: Teams, channels, users, members and channel content in concurrent maps
//! - **Message Cache**: Insertion-ordered, bounded; the oldest message is evicted first
//! - **Resolver**: Cache hit first, then an [`EntityFetcher`] fallback that populates the cache
//!
//! ## Example
//!
//! ```ignore
//! use guilded_cache::{CacheOptions, CacheStore, NullFetcher, Resolver};
//!
//! let cache = CacheStore::new_shared(CacheOptions::default());
//! let resolver = Resolver::new(cache.clone(), Arc::new(NullFetcher));
//!
//! let channel = resolver.getch_channel(Some("team-id"), "channel-id").await?;
//! ```

pub mod fetch;
pub mod store;

// Re-export store types
pub use store::{CacheOptions, CacheStore, MessageCache, SharedCacheStore};

// Re-export fetch types
pub use fetch::{EntityFetcher, FetchError, FetchResult, NullFetcher, Resolver};
