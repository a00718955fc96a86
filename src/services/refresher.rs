//! Refresh orchestrator: re-price every stored position and write the
//! evaluation engine's output back through the store.
//!
//! Positions are read as one snapshot at the start of a cycle and processed
//! in fixed-size batches; fetches inside a batch run concurrently and every
//! position succeeds or fails on its own.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use futures_util::future::join_all;
use metrics::{counter, gauge};
use serde::Serialize;
use tokio::time::{sleep, Duration};

use crate::engine::evaluate;
use crate::models::PositionUpdate;
use crate::pricing::PriceFetcher;
use crate::store::PositionStore;

const SMALL_BATCH: usize = 5;
const SMALL_BATCH_DELAY: Duration = Duration::from_millis(1000);
const LARGE_BATCH: usize = 10;
const LARGE_BATCH_DELAY: Duration = Duration::from_millis(250);
const LARGE_THRESHOLD: usize = 20;

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct RefreshReport {
    pub total: usize,
    pub success_count: usize,
    pub error_count: usize,
}

#[derive(Debug)]
pub enum CycleOutcome {
    Completed(RefreshReport),
    /// A previous cycle is still running; nothing was started.
    AlreadyRunning,
}

pub struct Refresher {
    store: Arc<PositionStore>,
    fetcher: Arc<PriceFetcher>,
    busy: AtomicBool,
}

impl Refresher {
    pub fn new(store: Arc<PositionStore>, fetcher: Arc<PriceFetcher>) -> Self {
        Self {
            store,
            fetcher,
            busy: AtomicBool::new(false),
        }
    }

    /// Run one refresh cycle, unless one is already in flight.
    pub async fn run_cycle(&self) -> anyhow::Result<CycleOutcome> {
        if self.busy.swap(true, Ordering::SeqCst) {
            tracing::debug!("refresh cycle already running, skipping");
            return Ok(CycleOutcome::AlreadyRunning);
        }
        let result = refresh_all(&self.store, &self.fetcher).await;
        self.busy.store(false, Ordering::SeqCst);
        result.map(CycleOutcome::Completed)
    }
}

/// Fetch a price for every position in the snapshot and persist the
/// evaluated next state. A failed fetch leaves that position untouched for
/// this cycle and only bumps the error counter.
pub async fn refresh_all(
    store: &PositionStore,
    fetcher: &PriceFetcher,
) -> anyhow::Result<RefreshReport> {
    let positions = store.list().await?;
    let mut report = RefreshReport {
        total: positions.len(),
        ..Default::default()
    };

    if positions.is_empty() {
        return Ok(report);
    }

    // Larger collections get bigger batches and shorter pauses; purely a
    // throughput knob.
    let (batch_size, delay) = if positions.len() > LARGE_THRESHOLD {
        (LARGE_BATCH, LARGE_BATCH_DELAY)
    } else {
        (SMALL_BATCH, SMALL_BATCH_DELAY)
    };

    tracing::info!(total = positions.len(), batch_size, "refresh cycle started");
    counter!("refresh_cycles_total").increment(1);
    gauge!("tracked_positions").set(positions.len() as f64);

    let batch_count = positions.len().div_ceil(batch_size);
    for (batch_idx, batch) in positions.chunks(batch_size).enumerate() {
        let fetches = batch.iter().map(|pos| fetcher.get_price(&pos.ticker));
        let quotes = join_all(fetches).await;

        for (pos, fetched) in batch.iter().zip(quotes) {
            let quote = match fetched {
                Ok(q) => q,
                Err(e) => {
                    tracing::warn!(ticker = %pos.ticker, error = %e, "price fetch failed, position left unchanged");
                    counter!("price_fetch_errors_total").increment(1);
                    report.error_count += 1;
                    continue;
                }
            };

            let evaluated = evaluate(pos, quote.price, Utc::now().date_naive());
            match store
                .update(pos.id, &PositionUpdate::from_evaluation(&evaluated))
                .await
            {
                Ok(Some(_)) => report.success_count += 1,
                Ok(None) => {
                    // deleted while the cycle was running
                    tracing::debug!(ticker = %pos.ticker, "position vanished mid-cycle");
                }
                Err(e) => {
                    tracing::error!(ticker = %pos.ticker, error = %e, "failed to persist refreshed position");
                    report.error_count += 1;
                }
            }
        }

        if batch_idx + 1 < batch_count {
            sleep(delay).await;
        }
    }

    tracing::info!(
        total = report.total,
        success = report.success_count,
        errors = report.error_count,
        "refresh cycle finished"
    );
    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
