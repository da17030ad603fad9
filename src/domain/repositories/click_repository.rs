//! Repository trait for the append-only click log.

use crate::domain::entities::NewClickEvent;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Append-only storage for click events.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickRepository: Send + Sync {
    /// Appends one click event.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn append(&self, event: NewClickEvent) -> Result<(), AppError>;

    /// Appends many click events in a single statement.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn append_batch(&self, events: Vec<NewClickEvent>) -> Result<(), AppError>;

    /// Deletes events recorded before `cutoff`, returning how many were removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64, AppError>;

    /// Counts recorded events for a link.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn count_for_link(&self, link_id: i64) -> Result<i64, AppError>;
}
