//! Redis sorted-set implementation of the Hot-Link Tracker.

use super::service::{HotLink, HotLinkTracker};
use crate::infrastructure::cache::CacheResult;
use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};
use tracing::debug;

const HOT_LINKS_KEY: &str = "hot_links";

/// Ranking stored in a Redis ZSET shared by all instances.
///
/// `ZINCRBY` is atomic per member. Pruning runs only after a bump leaves
/// the set above its high-water mark and trims it back to capacity with a
/// single `ZREMRANGEBYRANK`.
pub struct RedisHotLinks {
    client: ConnectionManager,
    capacity: usize,
    high_water: usize,
}

impl RedisHotLinks {
    pub fn new(client: ConnectionManager, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            client,
            capacity,
            high_water: capacity + (capacity / 10).max(1),
        }
    }
}

#[async_trait]
impl HotLinkTracker for RedisHotLinks {
    async fn bump(&self, slug: &str) -> CacheResult<()> {
        let mut conn = self.client.clone();

        let (_, size): (f64, usize) = redis::pipe()
            .zincr(HOT_LINKS_KEY, slug, 1)
            .zcard(HOT_LINKS_KEY)
            .query_async(&mut conn)
            .await?;

        if size > self.high_water {
            let overflow = (size - self.capacity) as isize;
            let removed: usize = conn
                .zremrangebyrank(HOT_LINKS_KEY, 0, overflow - 1)
                .await?;
            debug!("Pruned {} cold entries from hot links", removed);
        }

        Ok(())
    }

    async fn top(&self, n: usize) -> CacheResult<Vec<HotLink>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let mut conn = self.client.clone();

        let entries: Vec<(String, f64)> = conn
            .zrevrange_withscores(HOT_LINKS_KEY, 0, n as isize - 1)
            .await?;

        Ok(entries
            .into_iter()
            .map(|(slug, score)| HotLink {
                slug,
                score: score.max(0.0) as u64,
            })
            .collect())
    }

    async fn len(&self) -> CacheResult<usize> {
        let mut conn = self.client.clone();
        Ok(conn.zcard(HOT_LINKS_KEY).await?)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}
