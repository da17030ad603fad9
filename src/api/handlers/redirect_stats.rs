//! Handler for redirect-path operational statistics.

use axum::{
    Json,
    extract::{Query, State},
};
use tracing::warn;
use validator::Validate;

use crate::api::dto::redirect_stats::{
    CacheReport, ClickQueueReport, DEFAULT_TOP, HotLinksReport, RedirectStatsQuery,
    RedirectStatsResponse,
};
use crate::error::AppError;
use crate::state::AppState;

/// Reports cache effectiveness, the hottest links and click queue headroom.
///
/// # Endpoint
///
/// `GET /redirect/stats?top=N` (`N` in 1..=100, default 10)
///
/// Hot-link store failures degrade to an empty ranking rather than an error.
pub async fn redirect_stats_handler(
    State(state): State<AppState>,
    Query(params): Query<RedirectStatsQuery>,
) -> Result<Json<RedirectStatsResponse>, AppError> {
    params.validate()?;
    let top = params.top.unwrap_or(DEFAULT_TOP);

    let stats = state.cache.stats();
    let hit_rate = stats.hit_rate();

    let ranking = state.hot_links.top(top).await.unwrap_or_else(|e| {
        warn!("Hot-link ranking unavailable: {}", e);
        Vec::new()
    });
    let tracked = state.hot_links.len().await.ok();

    let queue = state.resolver.click_queue();

    Ok(Json(RedirectStatsResponse {
        cache: CacheReport {
            backend: state.cache.backend(),
            stats,
            hit_rate,
        },
        hot_links: HotLinksReport {
            capacity: state.hot_links.capacity(),
            tracked,
            top: ranking,
        },
        click_queue: ClickQueueReport {
            capacity: queue.max_capacity(),
            available: queue.capacity(),
        },
    }))
}
