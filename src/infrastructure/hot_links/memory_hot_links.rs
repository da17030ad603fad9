//! In-process Hot-Link Tracker: a [`TopN`] owned by a single actor task.

use super::service::{HotLink, HotLinkTracker};
use super::top_n::TopN;
use crate::infrastructure::cache::{CacheError, CacheResult};
use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

const QUEUE: usize = 4096;

enum Command {
    Bump { slug: String },
    Top {
        n: usize,
        reply: oneshot::Sender<Vec<(String, u64)>>,
    },
    Len { reply: oneshot::Sender<usize> },
}

/// Handle to the ranking actor.
///
/// Bumps are enqueued without waiting for the actor; reads wait for a reply.
pub struct MemoryHotLinks {
    tx: mpsc::Sender<Command>,
    capacity: usize,
}

impl MemoryHotLinks {
    /// Spawns the actor on the current runtime.
    pub fn spawn(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(QUEUE);
        let ranking = TopN::new(capacity);
        let capacity = ranking.capacity();
        tokio::spawn(run(ranking, rx));
        Self { tx, capacity }
    }

    async fn ask<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> CacheResult<T> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(build(reply))
            .await
            .map_err(|_| CacheError::ConnectionError("hot link actor stopped".to_string()))?;
        rx.await
            .map_err(|_| CacheError::OperationError("hot link actor dropped reply".to_string()))
    }
}

async fn run(mut ranking: TopN, mut rx: mpsc::Receiver<Command>) {
    while let Some(command) = rx.recv().await {
        match command {
            Command::Bump { slug } => {
                let pruned = ranking.bump(&slug);
                if pruned > 0 {
                    debug!("Pruned {} cold entries from hot links", pruned);
                }
            }
            Command::Top { n, reply } => {
                let _ = reply.send(ranking.top(n));
            }
            Command::Len { reply } => {
                let _ = reply.send(ranking.len());
            }
        }
    }
}

#[async_trait]
impl HotLinkTracker for MemoryHotLinks {
    async fn bump(&self, slug: &str) -> CacheResult<()> {
        self.tx
            .try_send(Command::Bump {
                slug: slug.to_string(),
            })
            .map_err(|e| CacheError::OperationError(format!("hot link queue: {}", e)))
    }

    async fn top(&self, n: usize) -> CacheResult<Vec<HotLink>> {
        let entries = self.ask(|reply| Command::Top { n, reply }).await?;
        Ok(entries
            .into_iter()
            .map(|(slug, score)| HotLink { slug, score })
            .collect())
    }

    async fn len(&self) -> CacheResult<usize> {
        self.ask(|reply| Command::Len { reply }).await
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_bump_then_top() {
        let tracker = MemoryHotLinks::spawn(100);

        for _ in 0..3 {
            tracker.bump("popular").await.unwrap();
        }
        tracker.bump("rare").await.unwrap();

        // The channel is FIFO, so the read observes every earlier bump.
        let top = tracker.top(10).await.unwrap();
        assert_eq!(
            top,
            vec![
                HotLink {
                    slug: "popular".to_string(),
                    score: 3
                },
                HotLink {
                    slug: "rare".to_string(),
                    score: 1
                },
            ]
        );
        assert_eq!(tracker.len().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_capacity_is_bounded() {
        let tracker = MemoryHotLinks::spawn(5);

        for i in 0..50 {
            tracker.bump(&format!("slug-{i}")).await.unwrap();
        }

        let len = tracker.len().await.unwrap();
        assert!(len <= 6, "ranking grew to {len}");
        assert_eq!(tracker.capacity(), 5);
    }
}
