//! Rate-limit windows and unique-visitor sets.
//!
//! - [`RedisCounters`] - shared between instances
//! - [`MemoryCounters`] - in-process actor store

mod memory_counters;
mod redis_counters;
mod service;

pub use memory_counters::MemoryCounters;
pub use redis_counters::RedisCounters;
pub use service::{CounterStore, rate_window_key, unique_visitors_key};

#[cfg(test)]
pub use service::MockCounterStore;
