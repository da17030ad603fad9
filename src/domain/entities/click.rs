//! Click entities representing accepted redirect events.

use chrono::{DateTime, Utc};

/// A persisted click event.
///
/// Append-only: created once per accepted click and never updated. Removed
/// only by the retention sweeper.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClickEvent {
    pub id: i64,
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub identity_hash: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub referrer: Option<String>,
    pub referrer_host: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub is_unique: bool,
}

/// Input data for appending a click event.
///
/// `identity_hash` is the HMAC of the client identity; the raw address is
/// never stored.
#[derive(Debug, Clone, Default)]
pub struct NewClickEvent {
    pub link_id: i64,
    pub clicked_at: DateTime<Utc>,
    pub identity_hash: Option<String>,
    pub device: Option<String>,
    pub browser: Option<String>,
    pub os: Option<String>,
    pub country: Option<String>,
    pub city: Option<String>,
    pub referrer: Option<String>,
    pub referrer_host: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_term: Option<String>,
    pub utm_content: Option<String>,
    pub is_unique: bool,
}

/// Aggregated counter delta for one link inside a recorded batch.
#[derive(Debug, Clone, PartialEq)]
pub struct ClickIncrement {
    pub link_id: i64,
    pub count: i64,
    pub last_clicked_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_click_event_defaults_are_empty() {
        let event = NewClickEvent {
            link_id: 42,
            clicked_at: Utc::now(),
            ..Default::default()
        };

        assert_eq!(event.link_id, 42);
        assert!(event.identity_hash.is_none());
        assert!(event.utm_campaign.is_none());
        assert!(!event.is_unique);
    }
}
