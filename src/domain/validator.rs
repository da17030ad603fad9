//! Redirect eligibility policy.

use chrono::{DateTime, Utc};

use crate::domain::entities::LinkSnapshot;

/// Reason a link may not be redirected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Inactive,
    Expired,
    MaxClicksReached,
}

/// Decides whether `link` may be redirected at `now`.
///
/// Checks run in a fixed order and the first failing one wins:
/// inactive flag, expiration, click limit. A link whose counter has reached
/// its limit is rejected even when it is still marked active.
pub fn validate(link: &LinkSnapshot, now: DateTime<Utc>) -> Option<Rejection> {
    if !link.is_active {
        return Some(Rejection::Inactive);
    }

    if link.expires_at.is_some_and(|expires_at| expires_at <= now) {
        return Some(Rejection::Expired);
    }

    if link
        .max_clicks
        .is_some_and(|max_clicks| link.click_count >= max_clicks)
    {
        return Some(Rejection::MaxClicksReached);
    }

    None
}
