//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain and application
//! layers.
//!
//! # Modules
//!
//! - [`cache`] - Link snapshot cache (Redis and in-process implementations)
//! - [`counters`] - Rate windows and unique-visitor sets
//! - [`hot_links`] - Bounded popularity ranking
//! - [`enrichment`] - User-agent, referrer, campaign and geo parsing
//! - [`memory`] - Sharded single-writer store used when Redis is absent
//! - [`persistence`] - PostgreSQL repository implementations
//! - [`maintenance`] - Click retention sweeper

pub mod cache;
pub mod counters;
pub mod enrichment;
pub mod hot_links;
pub mod maintenance;
pub mod memory;
pub mod persistence;
