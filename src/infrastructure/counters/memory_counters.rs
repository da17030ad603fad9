//! In-process implementation of [`CounterStore`].

use super::service::CounterStore;
use crate::infrastructure::cache::CacheResult;
use crate::infrastructure::memory::MemoryStore;
use async_trait::async_trait;
use std::time::Duration;

/// Counters private to this process, held by the shard actors.
pub struct MemoryCounters {
    store: MemoryStore,
}

impl MemoryCounters {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl CounterStore for MemoryCounters {
    async fn record_hit(&self, key: &str, window: Duration) -> CacheResult<u64> {
        self.store.hit_window(key, window).await
    }

    async fn add_to_set(&self, key: &str, member: &str, ttl: Duration) -> CacheResult<bool> {
        self.store.sadd_ex(key, member, ttl).await
    }

    async fn set_size(&self, key: &str) -> CacheResult<u64> {
        self.store.scard(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::counters::{rate_window_key, unique_visitors_key};

    #[tokio::test]
    async fn test_window_counts_hits() {
        let counters = MemoryCounters::new(MemoryStore::spawn(2));
        let key = rate_window_key("promo", "abcd");

        for expected in 1..=3 {
            let count = counters
                .record_hit(&key, Duration::from_secs(60))
                .await
                .unwrap();
            assert_eq!(count, expected);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_across_window_edge_stays_under_threshold() {
        let counters = MemoryCounters::new(MemoryStore::spawn(1));
        let key = rate_window_key("promo", "abcd");
        let window = Duration::from_secs(60);
        let threshold = 10;

        counters.record_hit(&key, window).await.unwrap();
        tokio::time::advance(Duration::from_secs(59)).await;

        let mut counted = 0;
        for _ in 0..9 {
            if counters.record_hit(&key, window).await.unwrap() <= threshold {
                counted += 1;
            }
        }
        tokio::time::advance(Duration::from_secs(2)).await;
        for _ in 0..10 {
            if counters.record_hit(&key, window).await.unwrap() <= threshold {
                counted += 1;
            }
        }

        // Only the hit at t=0 left the window; the 9 hits at t=59 still fill it.
        assert_eq!(counted, 10);
    }

    #[tokio::test]
    async fn test_unique_visitor_set() {
        let counters = MemoryCounters::new(MemoryStore::spawn(2));
        let key = unique_visitors_key("promo", "20240501");
        let ttl = Duration::from_secs(3600);

        assert!(counters.add_to_set(&key, "visitor-a", ttl).await.unwrap());
        assert!(!counters.add_to_set(&key, "visitor-a", ttl).await.unwrap());
        assert!(counters.add_to_set(&key, "visitor-b", ttl).await.unwrap());
        assert_eq!(counters.set_size(&key).await.unwrap(), 2);
    }
}
