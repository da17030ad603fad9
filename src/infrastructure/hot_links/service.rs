//! Hot-Link Tracker trait.

use async_trait::async_trait;
use serde::Serialize;

use crate::infrastructure::cache::CacheResult;

/// One ranked entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotLink {
    pub slug: String,
    pub score: u64,
}

/// Bounded popularity ranking of slugs.
///
/// # Implementations
///
/// - [`crate::infrastructure::hot_links::RedisHotLinks`] - Redis sorted set
/// - [`crate::infrastructure::hot_links::MemoryHotLinks`] - in-process indexed min-heap actor
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HotLinkTracker: Send + Sync {
    /// Adds one to `slug`'s score; may prune the lowest entries.
    async fn bump(&self, slug: &str) -> CacheResult<()>;

    /// Top `n` slugs by score, descending.
    async fn top(&self, n: usize) -> CacheResult<Vec<HotLink>>;

    /// Entries currently tracked.
    async fn len(&self) -> CacheResult<usize>;

    /// Capacity the ranking is pruned back to.
    fn capacity(&self) -> usize;
}
