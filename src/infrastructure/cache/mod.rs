//! Cache Layer for fast redirect lookups.
//!
//! Provides a [`CacheService`] trait with two implementations:
//! - [`RedisCache`] - Shared Redis-backed cache
//! - [`MemoryCache`] - In-process actor store, used when Redis is not configured

mod memory_cache;
mod redis_cache;
mod service;

pub use memory_cache::MemoryCache;
pub use redis_cache::{RedisCache, connect_redis};
pub use service::{CacheError, CacheResult, CacheService, CacheStats, CacheStatsSnapshot, link_key};

#[cfg(test)]
pub use service::MockCacheService;
