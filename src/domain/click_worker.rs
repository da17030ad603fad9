//! Background consumer of the click queue.

use std::sync::Arc;

use tokio::sync::{Semaphore, mpsc};
use tokio::task::JoinSet;
use tracing::{error, info};

use crate::application::services::ClickRecorder;
use crate::domain::click_event::ClickJob;

/// Drains the click queue until every sender is dropped.
///
/// Jobs are pulled in chunks of up to `batch_size`: a single job goes through
/// [`ClickRecorder::record`], larger chunks through
/// [`ClickRecorder::record_batch`]. At most `concurrency` chunks are in
/// flight at once. In-flight chunks are awaited before returning, so a
/// graceful shutdown does not lose queued clicks.
pub async fn run_click_worker(
    mut rx: mpsc::Receiver<ClickJob>,
    recorder: Arc<ClickRecorder>,
    batch_size: usize,
    concurrency: usize,
) {
    let batch_size = batch_size.max(1);
    let permits = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut in_flight = JoinSet::new();
    let mut buffer = Vec::with_capacity(batch_size);

    while rx.recv_many(&mut buffer, batch_size).await > 0 {
        let jobs = std::mem::replace(&mut buffer, Vec::with_capacity(batch_size));

        let Ok(permit) = permits.clone().acquire_owned().await else {
            break;
        };

        let recorder = recorder.clone();
        in_flight.spawn(async move {
            let _permit = permit;
            let result = if jobs.len() == 1 {
                match jobs.into_iter().next() {
                    Some(job) => recorder.record(job).await,
                    None => Ok(()),
                }
            } else {
                recorder.record_batch(jobs).await
            };
            if let Err(e) = result {
                error!("Click recording failed: {}", e);
            }
        });

        // Reap finished tasks so the set does not grow without bound.
        while in_flight.try_join_next().is_some() {}
    }

    while in_flight.join_next().await.is_some() {}
    info!("Click worker stopped");
}
