//! Periodic maintenance tasks.

pub mod retention;

pub use retention::{MAX_RETENTION_DAYS, spawn_retention_sweeper, sweep_clicks};
