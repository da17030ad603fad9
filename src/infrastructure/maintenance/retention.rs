//! Click retention sweeper.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::domain::repositories::ClickRepository;
use crate::error::AppError;

/// Longest accepted retention window (100 years).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

/// Deletes click events older than `retention_days` once.
///
/// Returns the number of deleted rows.
///
/// # Errors
///
/// - [`AppError::BadRequest`] if the cutoff falls outside the representable date range
/// - [`AppError::Internal`] on database errors
pub async fn sweep_clicks(
    clicks: &dyn ClickRepository,
    retention_days: u32,
) -> Result<u64, AppError> {
    let cutoff = TimeDelta::try_days(i64::from(retention_days))
        .and_then(|age| Utc::now().checked_sub_signed(age))
        .ok_or_else(|| {
            AppError::bad_request(format!(
                "Retention of {} days is out of range",
                retention_days
            ))
        })?;
    let removed = clicks.delete_older_than(cutoff).await?;

    metrics::counter!("click_events_swept_total").increment(removed);
    Ok(removed)
}

/// Spawns a task that runs [`sweep_clicks`] every `interval`.
///
/// The first sweep happens one interval after startup. Failures are logged
/// and retried on the next tick. Abort the returned handle to stop it.
pub fn spawn_retention_sweeper(
    clicks: Arc<dyn ClickRepository>,
    retention_days: u32,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting click retention sweeper: keep {} days, every {}s",
            retention_days,
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            match sweep_clicks(clicks.as_ref(), retention_days).await {
                Ok(0) => debug!("Retention sweep: nothing to remove"),
                Ok(removed) => info!("Retention sweep: removed {} click events", removed),
                Err(e) => warn!("Retention sweep failed: {}", e),
            }
        }
    })
}
