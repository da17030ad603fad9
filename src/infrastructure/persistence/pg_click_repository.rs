//! PostgreSQL implementation of the click event log.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::sync::Arc;

use crate::domain::entities::NewClickEvent;
use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// Bind parameters per row in [`PgClickRepository::append_batch`].
const COLUMNS_PER_ROW: usize = 16;

/// PostgreSQL's bind-parameter limit.
const MAX_BIND_PARAMS: usize = 65_535;

/// Append-only click storage.
pub struct PgClickRepository {
    pool: Arc<PgPool>,
}

impl PgClickRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

const INSERT_PREFIX: &str = "INSERT INTO click_events (link_id, clicked_at, identity_hash, \
     device, browser, os, country, city, referrer, referrer_host, \
     utm_source, utm_medium, utm_campaign, utm_term, utm_content, is_unique) ";

#[async_trait]
impl ClickRepository for PgClickRepository {
    async fn append(&self, event: NewClickEvent) -> Result<(), AppError> {
        self.append_batch(vec![event]).await
    }

    async fn append_batch(&self, events: Vec<NewClickEvent>) -> Result<(), AppError> {
        let rows_per_statement = MAX_BIND_PARAMS / COLUMNS_PER_ROW;

        let mut tx = self.pool.begin().await?;
        for chunk in events.chunks(rows_per_statement) {
            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(INSERT_PREFIX);
            builder.push_values(chunk, |mut row, event| {
                row.push_bind(event.link_id)
                    .push_bind(event.clicked_at)
                    .push_bind(&event.identity_hash)
                    .push_bind(&event.device)
                    .push_bind(&event.browser)
                    .push_bind(&event.os)
                    .push_bind(&event.country)
                    .push_bind(&event.city)
                    .push_bind(&event.referrer)
                    .push_bind(&event.referrer_host)
                    .push_bind(&event.utm_source)
                    .push_bind(&event.utm_medium)
                    .push_bind(&event.utm_campaign)
                    .push_bind(&event.utm_term)
                    .push_bind(&event.utm_content)
                    .push_bind(event.is_unique);
            });
            builder.build().execute(&mut *tx).await?;
        }
        tx.commit().await?;

        Ok(())
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM click_events WHERE clicked_at < $1")
            .bind(cutoff)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM click_events WHERE link_id = $1")
                .bind(link_id)
                .fetch_one(self.pool.as_ref())
                .await?;

        Ok(count)
    }
}
