//! In-process cache backed by the sharded actor store.

use super::service::{
    CacheResult, CacheService, CacheStats, CacheStatsSnapshot, bump_payload, link_key,
};
use crate::domain::entities::LinkSnapshot;
use crate::infrastructure::memory::MemoryStore;
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Cache used when Redis is not configured.
///
/// Entries are private to this process; every write goes through the owning
/// shard actor, so there is no shared mutable map.
pub struct MemoryCache {
    store: MemoryStore,
    default_ttl: Duration,
    stats: CacheStats,
}

impl MemoryCache {
    pub fn new(store: MemoryStore, default_ttl: Duration) -> Self {
        Self {
            store,
            default_ttl,
            stats: CacheStats::default(),
        }
    }

    /// Number of live snapshots.
    pub async fn len(&self) -> CacheResult<usize> {
        self.store.len().await
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get(&self, slug: &str) -> CacheResult<Option<LinkSnapshot>> {
        let payload = self
            .store
            .get(&link_key(slug))
            .await
            .inspect_err(|_| self.stats.record_error())?;

        match payload {
            Some(payload) => {
                let snapshot = serde_json::from_str(&payload)
                    .inspect_err(|_| self.stats.record_error())?;
                debug!("Cache HIT: {}", slug);
                self.stats.record_hit();
                Ok(Some(snapshot))
            }
            None => {
                debug!("Cache MISS: {}", slug);
                self.stats.record_miss();
                Ok(None)
            }
        }
    }

    async fn set(
        &self,
        slug: &str,
        snapshot: &LinkSnapshot,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        let payload = serde_json::to_string(snapshot)?;
        self.store
            .set_ex(&link_key(slug), payload, ttl.unwrap_or(self.default_ttl))
            .await
            .inspect_err(|_| self.stats.record_error())?;
        self.stats.record_set();
        Ok(())
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        if self
            .store
            .del(&link_key(slug))
            .await
            .inspect_err(|_| self.stats.record_error())?
        {
            debug!("Cache INVALIDATE: {}", slug);
        }
        self.stats.record_invalidation();
        Ok(())
    }

    async fn bump_cached_count(&self, slug: &str, by: i64) -> CacheResult<bool> {
        let key = link_key(slug);
        let Some(payload) = self.store.get(&key).await? else {
            return Ok(false);
        };

        // Two round trips: a concurrent bump between them is lost, which the
        // next refresh from the persistent store corrects.
        let bumped = self.store.set_keep_ttl(&key, bump_payload(&payload, by)?).await?;
        if bumped {
            self.stats.record_bump();
        }
        Ok(bumped)
    }

    async fn health_check(&self) -> bool {
        self.store.len().await.is_ok()
    }

    fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
