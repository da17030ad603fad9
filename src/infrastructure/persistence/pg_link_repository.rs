//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{ClickIncrement, LinkRecord};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;

/// PostgreSQL repository for link reads and click counters.
///
/// Queries are bound at runtime; all values travel as parameters.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<LinkRecord>, AppError> {
        let link = sqlx::query_as::<_, LinkRecord>(
            r#"
            SELECT id, slug, destination, is_active, expires_at, max_clicks,
                   click_count, last_clicked_at, password_hash, owner_id,
                   title, description, created_at
            FROM links
            WHERE slug = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(link)
    }

    async fn find_password_hash(&self, slug: &str) -> Result<Option<String>, AppError> {
        let hash = sqlx::query_scalar::<_, Option<String>>(
            "SELECT password_hash FROM links WHERE slug = $1 AND deleted_at IS NULL",
        )
        .bind(slug)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(hash.flatten())
    }

    async fn increment_clicks(&self, link_id: i64, at: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE links
            SET click_count = click_count + 1,
                last_clicked_at = GREATEST(COALESCE(last_clicked_at, $2), $2)
            WHERE id = $1
            "#,
        )
        .bind(link_id)
        .bind(at)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn increment_clicks_bulk(&self, increments: Vec<ClickIncrement>) -> Result<(), AppError> {
        if increments.is_empty() {
            return Ok(());
        }

        let mut ids = Vec::with_capacity(increments.len());
        let mut counts = Vec::with_capacity(increments.len());
        let mut stamps = Vec::with_capacity(increments.len());
        for inc in increments {
            ids.push(inc.link_id);
            counts.push(inc.count);
            stamps.push(inc.last_clicked_at);
        }

        sqlx::query(
            r#"
            UPDATE links AS l
            SET click_count = l.click_count + d.delta,
                last_clicked_at = GREATEST(COALESCE(l.last_clicked_at, d.at), d.at)
            FROM UNNEST($1::bigint[], $2::bigint[], $3::timestamptz[]) AS d(id, delta, at)
            WHERE l.id = d.id
            "#,
        )
        .bind(&ids)
        .bind(&counts)
        .bind(&stamps)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
