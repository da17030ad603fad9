//! Redis-backed cache implementation.

use super::service::{
    CacheError, CacheResult, CacheService, CacheStats, CacheStatsSnapshot, bump_payload, link_key,
};
use crate::domain::entities::LinkSnapshot;
use async_trait::async_trait;
use redis::{AsyncCommands, Client, aio::ConnectionManager};
use std::time::Duration;
use tracing::{debug, info};

/// Opens a managed Redis connection and validates it with a PING.
///
/// The returned manager is shared by the cache, counter and hot-link
/// stores.
///
/// # Errors
///
/// Returns [`CacheError::ConnectionError`] if the URL is invalid, the connection cannot
/// be established, or the PING health check fails.
pub async fn connect_redis(redis_url: &str) -> CacheResult<ConnectionManager> {
    info!("Connecting to Redis at {}", redis_url);

    let client = Client::open(redis_url).map_err(|e| {
        CacheError::ConnectionError(format!("Failed to create Redis client: {}", e))
    })?;

    let manager = ConnectionManager::new(client).await.map_err(|e| {
        CacheError::ConnectionError(format!("Failed to connect to Redis: {}", e))
    })?;

    let mut test_conn = manager.clone();
    test_conn
        .ping::<()>()
        .await
        .map_err(|e| CacheError::ConnectionError(format!("Redis PING failed: {}", e)))?;

    info!("✓ Connected to Redis");

    Ok(manager)
}

/// Redis cache of link snapshots.
///
/// Snapshots are stored as JSON strings under `link:{slug}` with `SET EX`.
pub struct RedisCache {
    client: ConnectionManager,
    default_ttl: Duration,
    stats: CacheStats,
}

impl RedisCache {
    /// Wraps an open connection.
    ///
    /// `default_ttl` applies when [`CacheService::set`] is called without a TTL;
    /// controlled via `CACHE_TTL_SECONDS`.
    pub fn new(client: ConnectionManager, default_ttl: Duration) -> Self {
        Self {
            client,
            default_ttl,
            stats: CacheStats::default(),
        }
    }
}

#[async_trait]
impl CacheService for RedisCache {
    async fn get(&self, slug: &str) -> CacheResult<Option<LinkSnapshot>> {
        let mut conn = self.client.clone();

        let payload = match conn.get::<_, Option<String>>(link_key(slug)).await {
            Ok(payload) => payload,
            Err(e) => {
                self.stats.record_error();
                return Err(e.into());
            }
        };

        match payload {
            Some(payload) => match serde_json::from_str(&payload) {
                Ok(snapshot) => {
                    debug!("Cache HIT: {}", slug);
                    self.stats.record_hit();
                    Ok(Some(snapshot))
                }
                Err(e) => {
                    self.stats.record_error();
                    Err(e.into())
                }
            },
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
        let mut conn = self.client.clone();
        let ttl = ttl.unwrap_or(self.default_ttl);
        let payload = serde_json::to_string(snapshot)?;

        conn.set_ex::<_, _, ()>(link_key(slug), payload, ttl.as_secs().max(1))
            .await
            .inspect_err(|_| self.stats.record_error())?;

        debug!("Cache SET: {} (TTL: {}s)", slug, ttl.as_secs());
        self.stats.record_set();
        Ok(())
    }

    async fn invalidate(&self, slug: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        let deleted = conn
            .del::<_, i32>(link_key(slug))
            .await
            .inspect_err(|_| self.stats.record_error())?;

        if deleted > 0 {
            debug!("Cache INVALIDATE: {}", slug);
        }
        self.stats.record_invalidation();
        Ok(())
    }

    async fn bump_cached_count(&self, slug: &str, by: i64) -> CacheResult<bool> {
        let mut conn = self.client.clone();
        let key = link_key(slug);

        let Some(payload) = conn
            .get::<_, Option<String>>(&key)
            .await
            .inspect_err(|_| self.stats.record_error())?
        else {
            return Ok(false);
        };

        let updated = bump_payload(&payload, by)?;

        // XX: never resurrect an entry that expired between GET and SET.
        let written: Option<String> = redis::cmd("SET")
            .arg(&key)
            .arg(updated)
            .arg("KEEPTTL")
            .arg("XX")
            .query_async(&mut conn)
            .await
            .inspect_err(|_| self.stats.record_error())?;

        let bumped = written.is_some();
        if bumped {
            self.stats.record_bump();
        }
        Ok(bumped)
    }

    async fn health_check(&self) -> bool {
        let mut conn = self.client.clone();
        conn.ping::<()>().await.is_ok()
    }

    fn stats(&self) -> CacheStatsSnapshot {
        self.stats.snapshot()
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
