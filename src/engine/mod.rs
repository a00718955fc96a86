//! Target/stop/buy-zone evaluation engine.
//!
//! `evaluate` is the single state-transition function for a position: given
//! the current record and a freshly observed price, it produces the next
//! record. Pure and synchronous — every caller (refresh cycle, user edits,
//! imports) funnels through it, so the hysteresis and exclusivity rules live
//! in exactly one place.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::models::{level, HitStatus, Position, StopStatus, ZoneStatus};

/// Percent change from `base` to `value`, guarded: a zero base means "no
/// meaningful baseline" and yields zero rather than a division error.
fn percent_from(base: Decimal, value: Decimal) -> Decimal {
    if base.is_zero() {
        Decimal::ZERO
    } else {
        (value - base) / base * Decimal::ONE_HUNDRED
    }
}

fn target_level(pos: &Position, idx: usize) -> Option<Decimal> {
    match idx {
        0 => level(pos.target1),
        1 => level(pos.target2),
        _ => level(pos.target3),
    }
}

fn target_hit(pos: &Position, idx: usize) -> HitStatus {
    match idx {
        0 => pos.target1_hit,
        1 => pos.target2_hit,
        _ => pos.target3_hit,
    }
}

fn set_target_hit(pos: &mut Position, idx: usize, status: HitStatus) {
    match idx {
        0 => pos.target1_hit = status,
        1 => pos.target2_hit = status,
        _ => pos.target3_hit = status,
    }
}

fn target_date(pos: &Position, idx: usize) -> Option<NaiveDate> {
    match idx {
        0 => pos.target1_date,
        1 => pos.target2_date,
        _ => pos.target3_date,
    }
}

fn set_target_date(pos: &mut Position, idx: usize, date: Option<NaiveDate>) {
    match idx {
        0 => pos.target1_date = date,
        1 => pos.target2_date = date,
        _ => pos.target3_date = date,
    }
}

/// Compute the next state of a position for a newly observed price.
///
/// Never mutates its input and never panics for finite inputs. `today` is
/// passed in (rather than read from the clock) so the function stays
/// deterministic; it is only used to stamp first-time target hits.
pub fn evaluate(position: &Position, new_price: Decimal, today: NaiveDate) -> Position {
    let mut next = position.clone();

    // 1. Record the price and the running percent since callout.
    next.current_price = new_price;
    next.percent_since_callout = percent_from(next.callout_price, new_price);

    // 2. Retrace reset: a previously hit target un-triggers when price falls
    //    back below it. Clearing the date lets a later re-trigger stamp a
    //    fresh one.
    for i in 0..3 {
        if target_hit(&next, i) == HitStatus::Yes {
            if let Some(t) = target_level(&next, i) {
                if new_price < t {
                    tracing::debug!(ticker = %next.ticker, target = i + 1, price = %new_price, "target retraced, resetting hit");
                    set_target_hit(&mut next, i, HitStatus::Unset);
                    set_target_date(&mut next, i, None);
                }
            }
        }
    }

    let stop_was_hit = position.stop_hit == StopStatus::Yes;
    let stop_was_deactivated = position.stop_hit == StopStatus::Deactivated;

    // 3. Hit detection, targets 1 → 2 → 3. When several targets trip in the
    //    same call the later one's percent-made wins (fixed iteration order).
    let mut pending_percent_made: Option<Decimal> = None;
    for i in 0..3 {
        if let Some(t) = target_level(&next, i) {
            if target_hit(&next, i) != HitStatus::Yes && !stop_was_hit && new_price >= t {
                tracing::info!(ticker = %next.ticker, target = i + 1, level = %t, price = %new_price, "target hit");
                set_target_hit(&mut next, i, HitStatus::Yes);
                if target_date(&next, i).is_none() {
                    set_target_date(&mut next, i, Some(today));
                }
                pending_percent_made = Some(percent_from(next.callout_price, t));
            }
        }
    }

    // 4. Buy zone, recomputed from scratch every call (no hysteresis).
    next.buy_zone_hit = match (level(next.buy_zone_low), level(next.buy_zone_high)) {
        (Some(low), Some(high)) => {
            if new_price >= low && new_price <= high {
                ZoneStatus::Yes
            } else {
                ZoneStatus::No
            }
        }
        (Some(low), None) => {
            if new_price <= low {
                ZoneStatus::Yes
            } else {
                ZoneStatus::No
            }
        }
        (None, Some(high)) => {
            if new_price <= high {
                ZoneStatus::Yes
            } else {
                ZoneStatus::No
            }
        }
        (None, None) => ZoneStatus::Unset,
    };

    // 5. Stop-loss. A triggered stop overrides any target percent-made from
    //    this call and forces every defined target to N/A.
    if let Some(stop) = level(next.stop_loss) {
        if !stop_was_hit && !stop_was_deactivated && new_price <= stop {
            tracing::info!(ticker = %next.ticker, stop = %stop, price = %new_price, "stop-loss triggered");
            next.stop_hit = StopStatus::Yes;
            pending_percent_made = Some(percent_from(next.callout_price, stop));
            for i in 0..3 {
                if target_level(&next, i).is_some() {
                    set_target_hit(&mut next, i, HitStatus::NotApplicable);
                }
            }
        }
    }

    // 6. Defined targets still unset default to NO, unless the stop is in
    //    its triggered state.
    if next.stop_hit != StopStatus::Yes {
        for i in 0..3 {
            if target_level(&next, i).is_some() && target_hit(&next, i) == HitStatus::Unset {
                set_target_hit(&mut next, i, HitStatus::No);
            }
        }
    }

    // 7. Stop auto-deactivation: once every defined target (at least one) is
    //    YES, a stop can no longer coexist with the result.
    let defined: Vec<usize> = (0..3).filter(|&i| target_level(&next, i).is_some()).collect();
    let all_defined_yes =
        !defined.is_empty() && defined.iter().all(|&i| target_hit(&next, i) == HitStatus::Yes);
    let any_yes = defined.iter().any(|&i| target_hit(&next, i) == HitStatus::Yes);

    if all_defined_yes && !stop_was_deactivated {
        next.stop_hit = StopStatus::Deactivated;
    } else if !any_yes && next.stop_hit == StopStatus::Unset && level(next.stop_loss).is_some() {
        next.stop_hit = StopStatus::NotApplicable;
    }

    // 8. Percent-made only moves on a hit event; otherwise the stale
    //    snapshot carries over.
    if let Some(pct) = pending_percent_made {
        next.percent_made = pct;
    }

    next
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
