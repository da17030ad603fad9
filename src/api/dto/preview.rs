//! DTOs for the link preview endpoint.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::entities::RedirectKind;

/// Public metadata of a short link, shown before following it.
///
/// The destination is withheld for password-protected links.
#[derive(Debug, Serialize)]
pub struct LinkPreviewResponse {
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub requires_password: bool,
    pub redirect_kind: RedirectKind,
    pub expires_at: Option<DateTime<Utc>>,
    pub click_count: i64,
    pub max_clicks: Option<i64>,
    /// `None` when the counter store is unavailable.
    pub unique_visitors_today: Option<u64>,
}
