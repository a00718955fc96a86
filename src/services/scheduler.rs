//! Periodic refresh driver with an explicit start/stop lifecycle.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::{interval, Duration};

use crate::store::PositionStore;

use super::refresher::{CycleOutcome, Refresher};

/// Spawn the periodic refresh task. Ticks are skipped while the store is
/// empty or a cycle is still in flight; aborting the returned handle stops
/// the scheduler.
pub fn spawn_refresh_scheduler(
    refresher: Arc<Refresher>,
    store: Arc<PositionStore>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(Duration::from_secs(interval_secs));
        // the first tick fires immediately; skip it so startup stays quiet
        ticker.tick().await;

        loop {
            ticker.tick().await;

            match store.list().await {
                Ok(positions) if positions.is_empty() => {
                    tracing::debug!("scheduler: no positions to refresh");
                    continue;
                }
                Ok(_) => {}
                Err(e) => {
                    tracing::error!(error = %e, "scheduler: failed to read positions");
                    continue;
                }
            }

            match refresher.run_cycle().await {
                Ok(CycleOutcome::Completed(report)) => {
                    tracing::info!(
                        success = report.success_count,
                        errors = report.error_count,
                        "scheduled refresh finished"
                    );
                }
                Ok(CycleOutcome::AlreadyRunning) => {
                    tracing::debug!("scheduled refresh skipped, cycle in flight");
                }
                Err(e) => {
                    tracing::error!(error = %e, "scheduled refresh failed");
                }
            }
        }
    })
}
