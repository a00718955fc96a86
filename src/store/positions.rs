//! Position store: an ordered collection of callouts persisted through the
//! key-value backend with whole-collection read/write semantics.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::engine::evaluate;
use crate::models::{HitStatus, NewPosition, Position, PositionUpdate, StopStatus};

use super::backend::KvBackend;

const POSITIONS_KEY: &str = "calltrack:positions";
const LAST_UPDATED_KEY: &str = "calltrack:last_updated";

/// One row of a bulk import, already parsed out of its tabular form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportRecord {
    pub ticker: String,
    pub date: Option<NaiveDate>,
    pub callout_price: Decimal,
    pub target1: Option<Decimal>,
    pub target2: Option<Decimal>,
    pub target3: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub buy_zone_low: Option<Decimal>,
    pub buy_zone_high: Option<Decimal>,
    pub current_price: Decimal,
    pub percent_since_callout: Decimal,
    pub percent_made: Decimal,
    pub target1_hit: HitStatus,
    pub target2_hit: HitStatus,
    pub target3_hit: HitStatus,
    pub stop_hit: StopStatus,
    pub target1_date: Option<NaiveDate>,
    pub target2_date: Option<NaiveDate>,
    pub target3_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub errors: usize,
}

pub struct PositionStore {
    backend: Arc<dyn KvBackend>,
    // Serializes read-modify-write cycles; the backend itself only knows
    // whole-value get/set.
    write_lock: Mutex<()>,
}

impl PositionStore {
    pub fn new(backend: Arc<dyn KvBackend>) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub async fn list(&self) -> anyhow::Result<Vec<Position>> {
        match self.backend.get(POSITIONS_KEY).await? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn get_by_id(&self, id: Uuid) -> anyhow::Result<Option<Position>> {
        Ok(self.list().await?.into_iter().find(|p| p.id == id))
    }

    /// When the collection was last successfully written, if ever.
    pub async fn last_updated(&self) -> anyhow::Result<Option<DateTime<Utc>>> {
        match self.backend.get(LAST_UPDATED_KEY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Create a position. The record is run through the evaluation engine
    /// against its initial price before persisting, so hit flags and percent
    /// fields are coherent from the first write.
    pub async fn add(&self, fields: NewPosition) -> anyhow::Result<Position> {
        let _guard = self.write_lock.lock().await;

        let position = Position::new(fields);
        let price = position.current_price;
        let evaluated = evaluate(&position, price, Utc::now().date_naive());

        let mut positions = self.list().await?;
        positions.push(evaluated.clone());
        self.save(&positions).await?;

        tracing::info!(ticker = %evaluated.ticker, id = %evaluated.id, "position added");
        Ok(evaluated)
    }

    /// Merge a partial update into a stored position. A changed callout
    /// price invalidates all prior hit history: the hit state is reset and
    /// the engine re-runs against the existing current price before the
    /// merge is persisted.
    pub async fn update(
        &self,
        id: Uuid,
        update: &PositionUpdate,
    ) -> anyhow::Result<Option<Position>> {
        let _guard = self.write_lock.lock().await;

        let mut positions = self.list().await?;
        let Some(idx) = positions.iter().position(|p| p.id == id) else {
            return Ok(None);
        };

        let existing = positions[idx].clone();
        let mut merged = existing.clone();
        merged.apply(update);

        let callout_changed = update
            .callout_price
            .is_some_and(|c| c != existing.callout_price);
        if callout_changed {
            tracing::info!(
                ticker = %merged.ticker,
                from = %existing.callout_price,
                to = %merged.callout_price,
                "callout price changed, resetting hit history"
            );
            merged.reset_hit_state();
            merged = evaluate(&merged, existing.current_price, Utc::now().date_naive());
        }

        merged.updated_at = Utc::now();
        positions[idx] = merged.clone();
        self.save(&positions).await?;

        Ok(Some(merged))
    }

    pub async fn delete(&self, id: Uuid) -> anyhow::Result<bool> {
        let _guard = self.write_lock.lock().await;

        let mut positions = self.list().await?;
        let before = positions.len();
        positions.retain(|p| p.id != id);
        if positions.len() == before {
            return Ok(false);
        }
        self.save(&positions).await?;
        Ok(true)
    }

    pub async fn clear(&self) -> anyhow::Result<()> {
        let _guard = self.write_lock.lock().await;
        self.backend.remove(POSITIONS_KEY).await?;
        self.backend.remove(LAST_UPDATED_KEY).await?;
        Ok(())
    }

    /// Bulk import. Rows with an empty ticker or a non-positive callout
    /// price are counted as errors and skipped; each accepted row is run
    /// through the engine against its own recorded price.
    pub async fn import_many(
        &self,
        records: Vec<ImportRecord>,
        clear_existing: bool,
    ) -> anyhow::Result<ImportReport> {
        let _guard = self.write_lock.lock().await;

        let mut positions = if clear_existing {
            Vec::new()
        } else {
            self.list().await?
        };

        let today = Utc::now().date_naive();
        let mut report = ImportReport::default();

        for record in records {
            if record.ticker.trim().is_empty() || record.callout_price <= Decimal::ZERO {
                report.errors += 1;
                continue;
            }

            let mut position = Position::new(NewPosition {
                ticker: record.ticker,
                date: record.date,
                callout_price: record.callout_price,
                target1: record.target1,
                target2: record.target2,
                target3: record.target3,
                stop_loss: record.stop_loss,
                buy_zone_low: record.buy_zone_low,
                buy_zone_high: record.buy_zone_high,
                current_price: record.current_price,
            });
            // Carry the imported hit history, then let the engine reconcile
            // it with the row's own price.
            position.percent_since_callout = record.percent_since_callout;
            position.percent_made = record.percent_made;
            position.target1_hit = record.target1_hit;
            position.target2_hit = record.target2_hit;
            position.target3_hit = record.target3_hit;
            position.stop_hit = record.stop_hit;
            position.target1_date = record.target1_date;
            position.target2_date = record.target2_date;
            position.target3_date = record.target3_date;

            let price = position.current_price;
            positions.push(evaluate(&position, price, today));
            report.imported += 1;
        }

        self.save(&positions).await?;
        tracing::info!(imported = report.imported, errors = report.errors, "import finished");
        Ok(report)
    }

    pub async fn export_all(&self) -> anyhow::Result<Vec<Position>> {
        self.list().await
    }

    async fn save(&self, positions: &[Position]) -> anyhow::Result<()> {
        self.backend
            .set(POSITIONS_KEY, &serde_json::to_value(positions)?)
            .await?;
        self.backend
            .set(LAST_UPDATED_KEY, &serde_json::to_value(Utc::now())?)
            .await?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
