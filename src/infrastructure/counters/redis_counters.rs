//! Redis implementation of [`CounterStore`].

use super::service::CounterStore;
use crate::infrastructure::cache::CacheResult;
use async_trait::async_trait;
use chrono::Utc;
use redis::aio::ConnectionManager;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Counters shared by every service instance through Redis.
pub struct RedisCounters {
    client: ConnectionManager,
    /// Distinguishes this process's hit members from other instances'.
    instance: String,
    sequence: AtomicU64,
}

impl RedisCounters {
    pub fn new(client: ConnectionManager) -> Self {
        let started = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        Self {
            client,
            instance: format!("{:x}{:x}", std::process::id(), started),
            sequence: AtomicU64::new(0),
        }
    }

    fn hit_member(&self, now_ms: i64) -> String {
        let seq = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{}:{}:{}", now_ms, self.instance, seq)
    }
}

#[async_trait]
impl CounterStore for RedisCounters {
    async fn record_hit(&self, key: &str, window: Duration) -> CacheResult<u64> {
        let mut conn = self.client.clone();
        let now_ms = Utc::now().timestamp_millis();
        let window_ms = window.as_millis().max(1) as i64;

        // Hits are scored by time; anything at or before now - window is out.
        let (count,): (u64,) = redis::pipe()
            .atomic()
            .cmd("ZREMRANGEBYSCORE")
            .arg(key)
            .arg("-inf")
            .arg(now_ms - window_ms)
            .ignore()
            .cmd("ZADD")
            .arg(key)
            .arg(now_ms)
            .arg(self.hit_member(now_ms))
            .ignore()
            .cmd("ZCARD")
            .arg(key)
            .cmd("PEXPIRE")
            .arg(key)
            .arg(window_ms)
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(count)
    }

    async fn add_to_set(&self, key: &str, member: &str, ttl: Duration) -> CacheResult<bool> {
        let mut conn = self.client.clone();

        let (added,): (u64,) = redis::pipe()
            .atomic()
            .cmd("SADD")
            .arg(key)
            .arg(member)
            .cmd("EXPIRE")
            .arg(key)
            .arg(ttl.as_secs().max(1))
            .ignore()
            .query_async(&mut conn)
            .await?;

        Ok(added > 0)
    }

    async fn set_size(&self, key: &str) -> CacheResult<u64> {
        let mut conn = self.client.clone();
        let size: u64 = redis::cmd("SCARD").arg(key).query_async(&mut conn).await?;
        Ok(size)
    }
}
