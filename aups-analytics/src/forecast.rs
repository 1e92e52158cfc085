//! Short-horizon demand forecast from a capped rolling growth rate.

use std::collections::BTreeMap;

use aups_core::{BiometricTable, ForecastPoint};
use chrono::Duration;
use tracing::debug;

/// Default projection horizon in days.
pub const DEFAULT_HORIZON_DAYS: u32 = 30;

/// Trailing dated points required before any forecast is produced.
/// Hard threshold, not configurable.
pub const TREND_WINDOW: usize = 14;

/// Daily growth cap for planning stability.
const GROWTH_CAP: f64 = 0.05;

/// Confidence band: starts at 5%, widens 1% per projected day.
const BASE_UNCERTAINTY: f64 = 0.05;
const UNCERTAINTY_STEP: f64 = 0.01;

/// Project daily update volume `days` forward, optionally restricted to one
/// state. One `ForecastPoint` per future day, in date order.
///
/// Returns an empty sequence when the (filtered) table is empty, has no
/// dates, or has fewer than [`TREND_WINDOW`] dated daily totals; that is the
/// insufficient-data signal, not an error. Expects `total_updates` to be
/// populated by the feature deriver.
pub fn generate_forecast(
    bio: &BiometricTable,
    state: Option<&str>,
    days: u32,
) -> Vec<ForecastPoint> {
    let filtered;
    let table = match state {
        Some(state) => {
            filtered = bio.filter_state(state);
            &filtered
        }
        None => bio,
    };

    if table.is_empty() || !table.has_dates() {
        return Vec::new();
    }

    // One total per date, ascending.
    let mut daily: BTreeMap<_, i64> = BTreeMap::new();
    for row in &table.rows {
        if let Some(date) = row.date {
            *daily.entry(date).or_insert(0) += row.total_updates;
        }
    }
    if daily.len() < TREND_WINDOW {
        debug!(
            points = daily.len(),
            needed = TREND_WINDOW,
            "insufficient history for forecast"
        );
        return Vec::new();
    }

    let trailing: Vec<(chrono::NaiveDate, i64)> = daily
        .into_iter()
        .rev()
        .take(TREND_WINDOW)
        .rev()
        .collect();

    // Mean day-over-day percentage change; pairs with a zero denominator are
    // undefined and skipped.
    let changes: Vec<f64> = trailing
        .windows(2)
        .filter(|w| w[0].1 > 0)
        .map(|w| (w[1].1 - w[0].1) as f64 / w[0].1 as f64)
        .collect();
    let avg_growth = if changes.is_empty() {
        0.0
    } else {
        changes.iter().sum::<f64>() / changes.len() as f64
    };
    let growth_factor = 1.0 + avg_growth.clamp(-GROWTH_CAP, GROWTH_CAP);

    let (last_date, last_val) = *trailing.last().expect("trailing window is non-empty");
    let mut current_val = last_val as f64;

    (1..=days as i64)
        .map(|i| {
            current_val *= growth_factor;
            let forecast = current_val.round() as i64;
            let uncertainty = BASE_UNCERTAINTY + UNCERTAINTY_STEP * i as f64;
            ForecastPoint {
                date: last_date + Duration::days(i),
                forecast,
                lower_ci: (forecast as f64 * (1.0 - uncertainty)).trunc() as i64,
                upper_ci: (forecast as f64 * (1.0 + uncertainty)).trunc() as i64,
            }
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================
