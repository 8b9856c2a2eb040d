//! Entity store module.

mod cache_store;
mod message_cache;

pub use cache_store::{CacheOptions, CacheStore, SharedCacheStore};
pub use message_cache::MessageCache;
