//! Hot-Link Tracker: bounded top-N popularity ranking.

mod memory_hot_links;
mod redis_hot_links;
mod service;
mod top_n;

pub use memory_hot_links::MemoryHotLinks;
pub use redis_hot_links::RedisHotLinks;
pub use service::{HotLink, HotLinkTracker};
pub use top_n::TopN;

#[cfg(test)]
pub use service::MockHotLinkTracker;
