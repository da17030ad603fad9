//! Link entities: the persisted record and the cacheable snapshot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A short link as stored in PostgreSQL.
///
/// `click_count` only ever grows; it is mutated exclusively through the
/// repository's atomic increment.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct LinkRecord {
    pub id: i64,
    pub slug: String,
    pub destination: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i64>,
    pub click_count: i64,
    pub last_clicked_at: Option<DateTime<Utc>>,
    pub password_hash: Option<String>,
    pub owner_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LinkRecord {
    /// Builds the cacheable subset of this record.
    ///
    /// The password hash never leaves the persistent store; the snapshot
    /// only remembers that one exists.
    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot {
            id: self.id,
            slug: self.slug.clone(),
            destination: self.destination.clone(),
            is_active: self.is_active,
            expires_at: self.expires_at,
            max_clicks: self.max_clicks,
            click_count: self.click_count,
            has_password: self.password_hash.is_some(),
            owner_id: self.owner_id,
            title: self.title.clone(),
            description: self.description.clone(),
        }
    }
}

/// Serialized form of a link held by the Cache Layer.
///
/// May be stale within its TTL; every policy check is re-run against it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkSnapshot {
    pub id: i64,
    pub slug: String,
    pub destination: String,
    pub is_active: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub max_clicks: Option<i64>,
    pub click_count: i64,
    pub has_password: bool,
    pub owner_id: Option<i64>,
    pub title: Option<String>,
    pub description: Option<String>,
}

impl LinkSnapshot {
    /// Redirect status chosen for this link.
    ///
    /// Links with an expiration policy get a temporary redirect so that
    /// downstream caches do not pin a destination that is about to vanish.
    pub fn redirect_kind(&self) -> RedirectKind {
        if self.expires_at.is_some() {
            RedirectKind::Temporary
        } else {
            RedirectKind::Permanent
        }
    }
}

/// HTTP redirect flavour returned by the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectKind {
    /// 307 Temporary Redirect
    Temporary,
    /// 308 Permanent Redirect
    Permanent,
}
