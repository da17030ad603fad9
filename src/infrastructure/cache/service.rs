//! Cache service trait, error types and hit/miss accounting.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::domain::entities::LinkSnapshot;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
    #[error("Cache payload error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<redis::RedisError> for CacheError {
    fn from(e: redis::RedisError) -> Self {
        if e.is_connection_dropped() || e.is_connection_refusal() || e.is_timeout() {
            Self::ConnectionError(e.to_string())
        } else {
            Self::OperationError(e.to_string())
        }
    }
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Cache-aside mirror of link snapshots keyed by slug.
///
/// The layer holds no business logic: the resolver decides when to populate
/// and when to invalidate. Implementations report failures as errors; callers
/// on the redirect path treat any error as a miss.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed, shared between instances
/// - [`crate::infrastructure::cache::MemoryCache`] - In-process actor store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the cached snapshot for a slug.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(snapshot))` on cache hit
    /// - `Ok(None)` on cache miss
    async fn get(&self, slug: &str) -> CacheResult<Option<LinkSnapshot>>;

    /// Stores a snapshot with the given TTL (implementation default if `None`).
    async fn set(
        &self,
        slug: &str,
        snapshot: &LinkSnapshot,
        ttl: Option<Duration>,
    ) -> CacheResult<()>;

    /// Removes a cached snapshot. Used when a link is updated or deleted.
    async fn invalidate(&self, slug: &str) -> CacheResult<()>;

    /// Optimistically adds `by` to the cached click count, keeping the
    /// remaining TTL.
    ///
    /// Best effort: an entry that expired in the meantime is not recreated,
    /// and two concurrent bumps may lose one increment. The persistent store
    /// stays authoritative and the next miss refreshes the snapshot.
    ///
    /// Returns `true` when a cached entry was updated.
    async fn bump_cached_count(&self, slug: &str, by: i64) -> CacheResult<bool>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Counters accumulated since startup.
    fn stats(&self) -> CacheStatsSnapshot;

    /// Short backend name for operator output.
    fn backend(&self) -> &'static str;
}

/// Lock-free cache counters shared by the cache implementations.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    sets: AtomicU64,
    invalidations: AtomicU64,
    bumps: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_set(&self) {
        self.sets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalidation(&self) {
        self.invalidations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_bump(&self) {
        self.bumps.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CacheStatsSnapshot {
        CacheStatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            sets: self.sets.load(Ordering::Relaxed),
            invalidations: self.invalidations.load(Ordering::Relaxed),
            bumps: self.bumps.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`CacheStats`].
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CacheStatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub errors: u64,
    pub sets: u64,
    pub invalidations: u64,
    pub bumps: u64,
}

impl CacheStatsSnapshot {
    /// hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Key under which a slug's snapshot is stored.
pub fn link_key(slug: &str) -> String {
    format!("link:{}", slug)
}

/// Decodes a cached payload, bumps its click count and re-encodes it.
pub(crate) fn bump_payload(payload: &str, by: i64) -> CacheResult<String> {
    let mut snapshot: LinkSnapshot = serde_json::from_str(payload)?;
    snapshot.click_count += by;
    Ok(serde_json::to_string(&snapshot)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_rate() {
        let stats = CacheStats::default();
        assert_eq!(stats.snapshot().hit_rate(), 0.0);

        stats.record_hit();
        stats.record_hit();
        stats.record_hit();
        stats.record_miss();

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.hits, 3);
        assert_eq!(snapshot.misses, 1);
        assert!((snapshot.hit_rate() - 0.75).abs() < f64::EPSILON);
    }

    #[test]
    fn test_bump_payload_increments_count() {
        let snapshot = LinkSnapshot {
            id: 1,
            slug: "s".to_string(),
            destination: "https://example.com".to_string(),
            is_active: true,
            expires_at: None,
            max_clicks: Some(5),
            click_count: 4,
            has_password: false,
            owner_id: None,
            title: None,
            description: None,
        };
        let payload = serde_json::to_string(&snapshot).unwrap();

        let bumped: LinkSnapshot = serde_json::from_str(&bump_payload(&payload, 2).unwrap()).unwrap();
        assert_eq!(bumped.click_count, 6);
        assert_eq!(bumped.destination, snapshot.destination);
    }

    #[test]
    fn test_bump_payload_rejects_garbage() {
        assert!(matches!(
            bump_payload("not json", 1),
            Err(CacheError::Serialization(_))
        ));
    }

    #[test]
    fn test_link_key() {
        assert_eq!(link_key("promo-2024"), "link:promo-2024");
    }
}
