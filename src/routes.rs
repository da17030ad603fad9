//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{slug}`                - Short link redirect
//! - `GET  /health`                - Health check: DB, click queue, cache
//! - `GET  /links/preview/{slug}`  - Link preview
//! - `GET  /redirect/stats`        - Operational statistics
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler};
use crate::api::middleware::tracing;
use crate::state::AppState;
use axum::Router;
use axum::routing::get;
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application router with all routes and middleware.
///
/// The client address for fraud screening and analytics is resolved per
/// request from `state.behind_proxy`.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    let router = Router::new()
        .route("/{slug}", get(redirect_handler))
        .route("/health", get(health_handler))
        .merge(api::routes::api_routes())
        .with_state(state)
        .layer(tracing::layer());

    NormalizePathLayer::trim_trailing_slash().layer(router)
}
