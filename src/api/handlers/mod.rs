//! HTTP request handlers.
//!
//! Each handler module corresponds to a logical grouping of endpoints.

pub mod health;
pub mod preview;
pub mod redirect;
pub mod redirect_stats;

pub use health::health_handler;
pub use preview::preview_handler;
pub use redirect::redirect_handler;
pub use redirect_stats::redirect_stats_handler;
