//! Ephemeral counters used by fraud screening and unique-visitor tracking.

use async_trait::async_trait;
use std::time::Duration;

use crate::infrastructure::cache::CacheResult;

/// Short-lived keyed counters and sets with native expiry.
///
/// Every key self-expires; nothing here is ever persisted.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Records a hit at `key` and returns how many hits fall inside the
    /// trailing `window`, this one included.
    ///
    /// The window slides: each hit ages out `window` after it was recorded.
    async fn record_hit(&self, key: &str, window: Duration) -> CacheResult<u64>;

    /// Adds `member` to the set at `key` and refreshes its expiry.
    ///
    /// Returns `true` when the member was new.
    async fn add_to_set(&self, key: &str, member: &str, ttl: Duration) -> CacheResult<bool>;

    /// Cardinality of the set at `key` (0 when absent).
    async fn set_size(&self, key: &str) -> CacheResult<u64>;
}

/// Rate-limit window key for a (slug, hashed identity) pair.
pub fn rate_window_key(slug: &str, identity_hash: &str) -> String {
    format!("rl:{}:{}", slug, identity_hash)
}

/// Unique-visitor set key for a slug on a UTC day (`YYYYMMDD`).
pub fn unique_visitors_key(slug: &str, day: &str) -> String {
    format!("uv:{}:{}", slug, day)
}
