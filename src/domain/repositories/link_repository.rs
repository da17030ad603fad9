//! Repository trait for short link data access on the redirect path.

use crate::domain::entities::{ClickIncrement, LinkRecord};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Read and counter access to the system of record for links.
///
/// Link CRUD lives outside this service; the redirect engine only reads
/// records and bumps counters.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgLinkRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LinkRepository: Send + Sync {
    /// Finds a link by its slug.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_slug(&self, slug: &str) -> Result<Option<LinkRecord>, AppError>;

    /// Reads only the password hash of a link.
    ///
    /// Password checks always go to the system of record because cached
    /// snapshots never hold hashes.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_password_hash(&self, slug: &str) -> Result<Option<String>, AppError>;

    /// Atomically adds one click and stamps the last click time.
    ///
    /// Must be a single server-side update, never read-modify-write.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_clicks(&self, link_id: i64, at: DateTime<Utc>) -> Result<(), AppError>;

    /// Applies several counter deltas in one statement.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn increment_clicks_bulk(&self, increments: Vec<ClickIncrement>) -> Result<(), AppError>;

    /// Round-trips to the database for health reporting.
    async fn ping(&self) -> Result<(), AppError>;
}
