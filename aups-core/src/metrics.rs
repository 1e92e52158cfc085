//! Derived analytics outputs: district metrics, forecast points, backtest results.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Per-district pressure metrics, one row per (state, district).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistrictMetric {
    pub state: String,
    pub district: String,
    /// Sum of biometric updates across all rows for the district.
    pub total_updates: i64,
    /// Sum of enrolments across all age bands, floored at 1.
    /// Districts with no enrolment data get 1, which deflates their true
    /// density; known precision gap, kept for score stability.
    pub total_enrolment: i64,
    /// Raw half-over-half growth rate, before clamping.
    pub growth_rate: f64,
    /// `total_updates / total_enrolment`.
    pub update_density: f64,
    /// `1 + clamp(growth_rate, -0.5, 2.0)`, always within [0.5, 3.0].
    pub growth_multiplier: f64,
    /// Raw pressure score: `update_density * growth_multiplier * 1000`.
    pub aups: f64,
    /// Score scaled to 0-100 against the maximum raw score in the current
    /// set of districts. Relative to whatever slice is in scope, so it is
    /// recomputed whenever the slice changes.
    pub aups_normalized: f64,
}

/// One projected day of operational demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    pub date: NaiveDate,
    pub forecast: i64,
    /// Lower edge of the confidence band; `lower_ci <= forecast <= upper_ci`.
    pub lower_ci: i64,
    pub upper_ci: i64,
}

/// Outcome of the split-half signal backtest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True when districts flagged high-pressure in the first half showed
    /// higher mean volume in the second half.
    pub is_valid: bool,
    /// Mean second-half volume across stressed districts. NaN when the
    /// stressed partition is empty.
    pub stressed_avg_t2: f64,
    /// Mean second-half volume across the remaining districts.
    pub normal_avg_t2: f64,
    /// `stressed_avg_t2 / normal_avg_t2`; 1.0 when the ratio is undefined.
    pub lift: f64,
}

/// Backtest result, with the degraded cases typed rather than sentinel-coded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BacktestOutcome {
    /// No row in the biometric table carries a date; accuracy is undefined.
    NoDateColumn,
    /// One half of the midpoint split came up empty.
    InsufficientSplit,
    /// Both halves populated; the signal was evaluated.
    Evaluated(ValidationResult),
}

impl BacktestOutcome {
    /// The evaluated result, if the backtest ran to completion.
    pub fn result(&self) -> Option<&ValidationResult> {
        match self {
            BacktestOutcome::Evaluated(r) => Some(r),
            _ => None,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
