//! DTOs for redirect-path operational statistics.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use validator::Validate;

use crate::infrastructure::cache::CacheStatsSnapshot;
use crate::infrastructure::hot_links::HotLink;

/// Default number of hot links returned.
pub const DEFAULT_TOP: usize = 10;

/// Query parameters for `GET /redirect/stats`.
#[serde_as]
#[derive(Debug, Deserialize, Validate)]
pub struct RedirectStatsQuery {
    #[serde_as(as = "Option<DisplayFromStr>")]
    #[serde(default)]
    #[validate(range(min = 1, max = 100))]
    pub top: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RedirectStatsResponse {
    pub cache: CacheReport,
    pub hot_links: HotLinksReport,
    pub click_queue: ClickQueueReport,
}

#[derive(Debug, Serialize)]
pub struct CacheReport {
    pub backend: &'static str,
    #[serde(flatten)]
    pub stats: CacheStatsSnapshot,
    pub hit_rate: f64,
}

#[derive(Debug, Serialize)]
pub struct HotLinksReport {
    pub capacity: usize,
    /// `None` when the hot-link store is unavailable.
    pub tracked: Option<usize>,
    pub top: Vec<HotLink>,
}

#[derive(Debug, Serialize)]
pub struct ClickQueueReport {
    pub capacity: usize,
    pub available: usize,
}
