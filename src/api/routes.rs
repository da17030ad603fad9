//! API route configuration.

use crate::api::handlers::{preview_handler, redirect_stats_handler};
use crate::state::AppState;
use axum::{Router, routing::get};

/// Read-only API routes next to the redirect itself.
///
/// # Endpoints
///
/// - `GET /links/preview/{slug}` - Link metadata without counting a click
/// - `GET /redirect/stats`       - Cache, hot-link and click queue statistics
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/links/preview/{slug}", get(preview_handler))
        .route("/redirect/stats", get(redirect_stats_handler))
}
