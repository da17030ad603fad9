//! Sharded single-writer key/value store.
//!
//! Each shard is a task that exclusively owns its map; callers talk to it
//! over a channel and wait for a oneshot reply. Keys carry a native TTL and
//! the store offers the same primitives the Redis backends rely on
//! (get/set-with-expiry, keep-TTL overwrite, sliding hit windows, set add).

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, HashSet, VecDeque};
use std::hash::{Hash, Hasher};
use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::debug;

use crate::infrastructure::cache::{CacheError, CacheResult};

const SHARD_QUEUE: usize = 1024;
const SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum Value {
    Text(String),
    Hits(VecDeque<Instant>),
    Set(HashSet<String>),
}

#[derive(Debug)]
struct Entry {
    value: Value,
    expires_at: Instant,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at > now
    }
}

enum Command {
    Get {
        key: String,
        reply: oneshot::Sender<Option<String>>,
    },
    SetEx {
        key: String,
        value: String,
        ttl: Duration,
        reply: oneshot::Sender<()>,
    },
    SetKeepTtl {
        key: String,
        value: String,
        reply: oneshot::Sender<bool>,
    },
    Del {
        key: String,
        reply: oneshot::Sender<bool>,
    },
    HitWindow {
        key: String,
        window: Duration,
        reply: oneshot::Sender<u64>,
    },
    SAddEx {
        key: String,
        member: String,
        ttl: Duration,
        reply: oneshot::Sender<bool>,
    },
    SCard {
        key: String,
        reply: oneshot::Sender<u64>,
    },
    Len {
        reply: oneshot::Sender<usize>,
    },
}

/// Handle to the shard actors. Cheap to clone.
#[derive(Clone)]
pub struct MemoryStore {
    shards: Vec<mpsc::Sender<Command>>,
}

impl MemoryStore {
    /// Spawns `shard_count` actors on the current runtime.
    pub fn spawn(shard_count: usize) -> Self {
        let shard_count = shard_count.max(1);
        let shards = (0..shard_count)
            .map(|index| {
                let (tx, rx) = mpsc::channel(SHARD_QUEUE);
                tokio::spawn(run_shard(index, rx));
                tx
            })
            .collect();

        Self { shards }
    }

    fn shard(&self, key: &str) -> &mpsc::Sender<Command> {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        let index = (hasher.finish() % self.shards.len() as u64) as usize;
        &self.shards[index]
    }

    async fn request<T>(
        &self,
        key: &str,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> CacheResult<T> {
        let (reply, rx) = oneshot::channel();
        self.shard(key)
            .send(build(reply))
            .await
            .map_err(|_| CacheError::ConnectionError("memory store shard stopped".to_string()))?;
        rx.await
            .map_err(|_| CacheError::OperationError("memory store dropped reply".to_string()))
    }

    pub async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let key_owned = key.to_string();
        self.request(key, |reply| Command::Get {
            key: key_owned,
            reply,
        })
        .await
    }

    pub async fn set_ex(&self, key: &str, value: String, ttl: Duration) -> CacheResult<()> {
        let key_owned = key.to_string();
        self.request(key, |reply| Command::SetEx {
            key: key_owned,
            value,
            ttl,
            reply,
        })
        .await
    }

    /// Overwrites an existing live key without touching its expiry.
    ///
    /// Returns `false` when the key is absent or already expired.
    pub async fn set_keep_ttl(&self, key: &str, value: String) -> CacheResult<bool> {
        let key_owned = key.to_string();
        self.request(key, |reply| Command::SetKeepTtl {
            key: key_owned,
            value,
            reply,
        })
        .await
    }

    pub async fn del(&self, key: &str) -> CacheResult<bool> {
        let key_owned = key.to_string();
        self.request(key, |reply| Command::Del {
            key: key_owned,
            reply,
        })
        .await
    }

    /// Records a hit at `key` and returns the hits seen in the trailing
    /// `window`, this one included.
    ///
    /// Hits older than `window` are dropped; the key expires one window
    /// after its latest hit.
    pub async fn hit_window(&self, key: &str, window: Duration) -> CacheResult<u64> {
        let key_owned = key.to_string();
        self.request(key, |reply| Command::HitWindow {
            key: key_owned,
            window,
            reply,
        })
        .await
    }

    /// Adds `member` to a set and refreshes the set's expiry to `ttl`.
    ///
    /// Returns `true` when the member was not present before.
    pub async fn sadd_ex(&self, key: &str, member: &str, ttl: Duration) -> CacheResult<bool> {
        let key_owned = key.to_string();
        let member = member.to_string();
        self.request(key, |reply| Command::SAddEx {
            key: key_owned,
            member,
            ttl,
            reply,
        })
        .await
    }

    pub async fn scard(&self, key: &str) -> CacheResult<u64> {
        let key_owned = key.to_string();
        self.request(key, |reply| Command::SCard {
            key: key_owned,
            reply,
        })
        .await
    }

    /// Number of live keys across all shards.
    pub async fn len(&self) -> CacheResult<usize> {
        let mut total = 0;
        for shard in &self.shards {
            let (reply, rx) = oneshot::channel();
            shard
                .send(Command::Len { reply })
                .await
                .map_err(|_| CacheError::ConnectionError("memory store shard stopped".to_string()))?;
            total += rx
                .await
                .map_err(|_| CacheError::OperationError("memory store dropped reply".to_string()))?;
        }
        Ok(total)
    }
}

async fn run_shard(index: usize, mut rx: mpsc::Receiver<Command>) {
    let mut map: HashMap<String, Entry> = HashMap::new();
    let mut sweep = tokio::time::interval(SWEEP_INTERVAL);
    sweep.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            command = rx.recv() => {
                match command {
                    Some(command) => apply(&mut map, command),
                    None => break,
                }
            }
            _ = sweep.tick() => {
                let now = Instant::now();
                let before = map.len();
                map.retain(|_, entry| entry.is_live(now));
                let removed = before - map.len();
                if removed > 0 {
                    debug!("Memory store shard {} swept {} expired keys", index, removed);
                }
            }
        }
    }

    debug!("Memory store shard {} stopped", index);
}

fn live<'a>(map: &'a mut HashMap<String, Entry>, key: &str, now: Instant) -> Option<&'a mut Entry> {
    if map.get(key).is_some_and(|entry| !entry.is_live(now)) {
        map.remove(key);
    }
    map.get_mut(key)
}

fn apply(map: &mut HashMap<String, Entry>, command: Command) {
    let now = Instant::now();

    // A dropped receiver means the caller gave up (timeout); nothing to do.
    match command {
        Command::Get { key, reply } => {
            let value = match live(map, &key, now).map(|entry| &entry.value) {
                Some(Value::Text(text)) => Some(text.clone()),
                _ => None,
            };
            let _ = reply.send(value);
        }
        Command::SetEx {
            key,
            value,
            ttl,
            reply,
        } => {
            map.insert(
                key,
                Entry {
                    value: Value::Text(value),
                    expires_at: now + ttl,
                },
            );
            let _ = reply.send(());
        }
        Command::SetKeepTtl { key, value, reply } => {
            let updated = match live(map, &key, now) {
                Some(entry) => {
                    entry.value = Value::Text(value);
                    true
                }
                None => false,
            };
            let _ = reply.send(updated);
        }
        Command::Del { key, reply } => {
            let removed = map.remove(&key).is_some_and(|entry| entry.is_live(now));
            let _ = reply.send(removed);
        }
        Command::HitWindow { key, window, reply } => {
            let count = match live(map, &key, now) {
                Some(Entry {
                    value: Value::Hits(hits),
                    expires_at,
                }) => {
                    while hits.front().is_some_and(|at| now.duration_since(*at) >= window) {
                        hits.pop_front();
                    }
                    hits.push_back(now);
                    *expires_at = now + window;
                    hits.len() as u64
                }
                _ => {
                    map.insert(
                        key,
                        Entry {
                            value: Value::Hits(VecDeque::from([now])),
                            expires_at: now + window,
                        },
                    );
                    1
                }
            };
            let _ = reply.send(count);
        }
        Command::SAddEx {
            key,
            member,
            ttl,
            reply,
        } => {
            let added = match live(map, &key, now) {
                Some(Entry {
                    value: Value::Set(members),
                    expires_at,
                }) => {
                    *expires_at = now + ttl;
                    members.insert(member)
                }
                _ => {
                    map.insert(
                        key,
                        Entry {
                            value: Value::Set(HashSet::from([member])),
                            expires_at: now + ttl,
                        },
                    );
                    true
                }
            };
            let _ = reply.send(added);
        }
        Command::SCard { key, reply } => {
            let size = match live(map, &key, now).map(|entry| &entry.value) {
                Some(Value::Set(members)) => members.len() as u64,
                _ => 0,
            };
            let _ = reply.send(size);
        }
        Command::Len { reply } => {
            let count = map.values().filter(|entry| entry.is_live(now)).count();
            let _ = reply.send(count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_and_get() {
        let store = MemoryStore::spawn(4);

        store
            .set_ex("link:abc", "payload".to_string(), Duration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(store.get("link:abc").await.unwrap(), Some("payload".to_string()));
        assert_eq!(store.get("link:missing").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_expire() {
        let store = MemoryStore::spawn(1);

        store
            .set_ex("k", "v".to_string(), Duration::from_secs(1))
            .await
            .unwrap();
        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(store.get("k").await.unwrap(), None);
        assert!(!store.set_keep_ttl("k", "w".to_string()).await.unwrap());
    }

    #[tokio::test]
    async fn test_set_keep_ttl_requires_existing_key() {
        let store = MemoryStore::spawn(2);

        assert!(!store.set_keep_ttl("absent", "x".to_string()).await.unwrap());

        store
            .set_ex("present", "x".to_string(), Duration::from_secs(60))
            .await
            .unwrap();
        assert!(store.set_keep_ttl("present", "y".to_string()).await.unwrap());
        assert_eq!(store.get("present").await.unwrap(), Some("y".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_window_slides() {
        let store = MemoryStore::spawn(1);
        let window = Duration::from_secs(60);

        assert_eq!(store.hit_window("rl", window).await.unwrap(), 1);
        tokio::time::advance(Duration::from_secs(30)).await;
        assert_eq!(store.hit_window("rl", window).await.unwrap(), 2);

        // The first hit has aged out, the second is still inside.
        tokio::time::advance(Duration::from_secs(31)).await;
        assert_eq!(store.hit_window("rl", window).await.unwrap(), 2);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert_eq!(store.hit_window("rl", window).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_set_add_reports_new_members() {
        let store = MemoryStore::spawn(2);
        let ttl = Duration::from_secs(60);

        assert!(store.sadd_ex("uv", "a", ttl).await.unwrap());
        assert!(!store.sadd_ex("uv", "a", ttl).await.unwrap());
        assert!(store.sadd_ex("uv", "b", ttl).await.unwrap());
        assert_eq!(store.scard("uv").await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_del_and_len() {
        let store = MemoryStore::spawn(3);
        let ttl = Duration::from_secs(60);

        store.set_ex("a", "1".to_string(), ttl).await.unwrap();
        store.set_ex("b", "2".to_string(), ttl).await.unwrap();
        assert_eq!(store.len().await.unwrap(), 2);

        assert!(store.del("a").await.unwrap());
        assert!(!store.del("a").await.unwrap());
        assert_eq!(store.len().await.unwrap(), 1);
    }
}
