//! In-process replacement for the shared keyed store.

mod store;

pub use store::MemoryStore;
