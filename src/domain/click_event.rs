//! Request signals and the click job handed to the background recorder.

use chrono::{DateTime, Utc};

/// Client-side signals captured from a redirect request.
///
/// Everything is optional: missing headers are common and must never fail a
/// redirect. `ip` is the raw client address; it is used for geolocation and
/// hashing only and is never persisted.
#[derive(Debug, Clone, Default)]
pub struct RequestSignals {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
    pub accept: Option<String>,
    pub accept_language: Option<String>,
    /// Country code forwarded by a trusted edge (e.g. `CF-IPCountry`).
    pub country_hint: Option<String>,
    /// Raw query string of the redirect request, used for campaign tags.
    pub query: Option<String>,
}

impl RequestSignals {
    /// Identity the fraud guard and unique-visitor sets key on.
    ///
    /// Falls back to the user agent when no address is known so that
    /// anonymous traffic still lands in a bucket.
    pub fn identity(&self) -> &str {
        self.ip
            .as_deref()
            .or(self.user_agent.as_deref())
            .unwrap_or("anonymous")
    }
}

/// A click accepted by the resolver, waiting to be recorded.
///
/// Carries denormalized link data so the worker never needs to look the
/// link up again.
#[derive(Debug, Clone)]
pub struct ClickJob {
    pub slug: String,
    pub link_id: i64,
    pub owner_id: Option<i64>,
    pub occurred_at: DateTime<Utc>,
    pub signals: RequestSignals,
}

impl ClickJob {
    pub fn new(slug: String, link_id: i64, owner_id: Option<i64>, signals: RequestSignals) -> Self {
        Self {
            slug,
            link_id,
            owner_id,
            occurred_at: Utc::now(),
            signals,
        }
    }
}
