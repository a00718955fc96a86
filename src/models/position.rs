use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Status enums
// ---------------------------------------------------------------------------

/// Per-target hit state. `Unset` means the target is undefined or has not
/// been evaluated yet; `NotApplicable` means the stop-loss fired first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HitStatus {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "NO")]
    No,
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl HitStatus {
    /// Lenient parse for spreadsheet cells ("y", "Yes", "n/a", ...).
    pub fn from_cell(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => HitStatus::Yes,
            "no" | "n" => HitStatus::No,
            "n/a" | "na" => HitStatus::NotApplicable,
            _ => HitStatus::Unset,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HitStatus::Unset => "",
            HitStatus::No => "NO",
            HitStatus::Yes => "YES",
            HitStatus::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for HitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stop-loss state. `Deactivated` ("X") means every defined target was hit,
/// so the stop no longer applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum StopStatus {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "NO")]
    No,
    #[serde(rename = "N/A")]
    NotApplicable,
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "X")]
    Deactivated,
}

impl StopStatus {
    pub fn from_cell(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "yes" | "y" => StopStatus::Yes,
            "no" | "n" => StopStatus::No,
            "n/a" | "na" => StopStatus::NotApplicable,
            "x" => StopStatus::Deactivated,
            _ => StopStatus::Unset,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StopStatus::Unset => "",
            StopStatus::No => "NO",
            StopStatus::NotApplicable => "N/A",
            StopStatus::Yes => "YES",
            StopStatus::Deactivated => "X",
        }
    }
}

impl fmt::Display for StopStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Buy-zone state, recomputed from scratch on every evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZoneStatus {
    #[default]
    #[serde(rename = "")]
    Unset,
    #[serde(rename = "YES")]
    Yes,
    #[serde(rename = "NO")]
    No,
}

impl ZoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ZoneStatus::Unset => "",
            ZoneStatus::Yes => "YES",
            ZoneStatus::No => "NO",
        }
    }
}

impl fmt::Display for ZoneStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// One tracked callout: an entry price plus optional targets, stop-loss and
/// buy-zone, with the hit state recorded by the evaluation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub ticker: String,
    pub date: Option<NaiveDate>,
    pub callout_price: Decimal,
    pub target1: Option<Decimal>,
    pub target2: Option<Decimal>,
    pub target3: Option<Decimal>,
    pub stop_loss: Option<Decimal>,
    pub buy_zone_low: Option<Decimal>,
    pub buy_zone_high: Option<Decimal>,
    /// Most recently observed market price; zero means unknown.
    pub current_price: Decimal,
    pub percent_since_callout: Decimal,
    /// Snapshot of gain/loss captured at the moment a target or the stop was
    /// hit. Deliberately stale until the next hit event overwrites it.
    pub percent_made: Decimal,
    pub target1_hit: HitStatus,
    pub target2_hit: HitStatus,
    pub target3_hit: HitStatus,
    pub stop_hit: StopStatus,
    pub buy_zone_hit: ZoneStatus,
    pub target1_date: Option<NaiveDate>,
    pub target2_date: Option<NaiveDate>,
    pub target3_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A price level of exactly zero counts as "not defined".
pub fn level(value: Option<Decimal>) -> Option<Decimal> {
    value.filter(|p| !p.is_zero())
}

impl Position {
    /// Build a fresh record from user-supplied fields. Hit state starts
    /// unset; callers run the evaluation engine before persisting.
    pub fn new(fields: NewPosition) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ticker: fields.ticker.trim().to_uppercase(),
            date: fields.date,
            callout_price: fields.callout_price,
            target1: level(fields.target1),
            target2: level(fields.target2),
            target3: level(fields.target3),
            stop_loss: level(fields.stop_loss),
            buy_zone_low: level(fields.buy_zone_low),
            buy_zone_high: level(fields.buy_zone_high),
            current_price: fields.current_price,
            percent_since_callout: Decimal::ZERO,
            percent_made: Decimal::ZERO,
            target1_hit: HitStatus::Unset,
            target2_hit: HitStatus::Unset,
            target3_hit: HitStatus::Unset,
            stop_hit: StopStatus::Unset,
            buy_zone_hit: ZoneStatus::Unset,
            target1_date: None,
            target2_date: None,
            target3_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge a partial update: present fields overwrite, absent fields leave
    /// the stored value untouched. Does not bump `updated_at` — the store
    /// owns that.
    pub fn apply(&mut self, update: &PositionUpdate) {
        if let Some(ticker) = &update.ticker {
            self.ticker = ticker.trim().to_uppercase();
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(callout) = update.callout_price {
            self.callout_price = callout;
        }
        if let Some(t1) = update.target1 {
            self.target1 = level(t1);
        }
        if let Some(t2) = update.target2 {
            self.target2 = level(t2);
        }
        if let Some(t3) = update.target3 {
            self.target3 = level(t3);
        }
        if let Some(stop) = update.stop_loss {
            self.stop_loss = level(stop);
        }
        if let Some(low) = update.buy_zone_low {
            self.buy_zone_low = level(low);
        }
        if let Some(high) = update.buy_zone_high {
            self.buy_zone_high = level(high);
        }
        if let Some(price) = update.current_price {
            self.current_price = price;
        }
        if let Some(pct) = update.percent_since_callout {
            self.percent_since_callout = pct;
        }
        if let Some(pct) = update.percent_made {
            self.percent_made = pct;
        }
        if let Some(hit) = update.target1_hit {
            self.target1_hit = hit;
        }
        if let Some(hit) = update.target2_hit {
            self.target2_hit = hit;
        }
        if let Some(hit) = update.target3_hit {
            self.target3_hit = hit;
        }
        if let Some(stop) = update.stop_hit {
            self.stop_hit = stop;
        }
        if let Some(zone) = update.buy_zone_hit {
            self.buy_zone_hit = zone;
        }
        if let Some(d) = update.target1_date {
            self.target1_date = d;
        }
        if let Some(d) = update.target2_date {
            self.target2_date = d;
        }
        if let Some(d) = update.target3_date {
            self.target3_date = d;
        }
    }

    /// Reset every field derived from hit detection. Used when the callout
    /// price changes, which invalidates all prior hit history.
    pub fn reset_hit_state(&mut self) {
        self.target1_hit = HitStatus::Unset;
        self.target2_hit = HitStatus::Unset;
        self.target3_hit = HitStatus::Unset;
        self.stop_hit = StopStatus::Unset;
        self.buy_zone_hit = ZoneStatus::Unset;
        self.target1_date = None;
        self.target2_date = None;
        self.target3_date = None;
        self.percent_made = Decimal::ZERO;
    }
}

/// User-supplied fields for creating a position.
#[derive(Debug, Clone, Default)]
pub struct NewPosition {
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
}

/// Field-level partial update with an explicit merge rule: `Some` overwrites,
/// `None` leaves the stored value alone. Optional price levels and dates use
/// a nested `Option` so an update can clear them (`Some(None)`).
#[derive(Debug, Clone, Default)]
pub struct PositionUpdate {
    pub ticker: Option<String>,
    pub date: Option<Option<NaiveDate>>,
    pub callout_price: Option<Decimal>,
    pub target1: Option<Option<Decimal>>,
    pub target2: Option<Option<Decimal>>,
    pub target3: Option<Option<Decimal>>,
    pub stop_loss: Option<Option<Decimal>>,
    pub buy_zone_low: Option<Option<Decimal>>,
    pub buy_zone_high: Option<Option<Decimal>>,
    pub current_price: Option<Decimal>,
    pub percent_since_callout: Option<Decimal>,
    pub percent_made: Option<Decimal>,
    pub target1_hit: Option<HitStatus>,
    pub target2_hit: Option<HitStatus>,
    pub target3_hit: Option<HitStatus>,
    pub stop_hit: Option<StopStatus>,
    pub buy_zone_hit: Option<ZoneStatus>,
    pub target1_date: Option<Option<NaiveDate>>,
    pub target2_date: Option<Option<NaiveDate>>,
    pub target3_date: Option<Option<NaiveDate>>,
}

impl PositionUpdate {
    /// Capture every engine-derived field of an evaluated position, for
    /// writing a refresh result back through the store.
    pub fn from_evaluation(evaluated: &Position) -> Self {
        Self {
            current_price: Some(evaluated.current_price),
            percent_since_callout: Some(evaluated.percent_since_callout),
            percent_made: Some(evaluated.percent_made),
            target1_hit: Some(evaluated.target1_hit),
            target2_hit: Some(evaluated.target2_hit),
            target3_hit: Some(evaluated.target3_hit),
            stop_hit: Some(evaluated.stop_hit),
            buy_zone_hit: Some(evaluated.buy_zone_hit),
            target1_date: Some(evaluated.target1_date),
            target2_date: Some(evaluated.target2_date),
            target3_date: Some(evaluated.target3_date),
            ..Default::default()
        }
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.ticker.is_none()
            && self.date.is_none()
            && self.callout_price.is_none()
            && self.target1.is_none()
            && self.target2.is_none()
            && self.target3.is_none()
            && self.stop_loss.is_none()
            && self.buy_zone_low.is_none()
            && self.buy_zone_high.is_none()
            && self.current_price.is_none()
            && self.percent_since_callout.is_none()
            && self.percent_made.is_none()
            && self.target1_hit.is_none()
            && self.target2_hit.is_none()
            && self.target3_hit.is_none()
            && self.stop_hit.is_none()
            && self.buy_zone_hit.is_none()
            && self.target1_date.is_none()
            && self.target2_date.is_none()
            && self.target3_date.is_none()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
