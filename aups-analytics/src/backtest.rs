//! Split-half backtest: does a high AUPS in the first half of history
//! predict higher update volume in the second half?

use std::collections::{BTreeMap, BTreeSet};

use aups_core::{BacktestOutcome, BiometricTable, DistrictKey, EnrolmentTable, ValidationResult};
use tracing::debug;

use crate::district::compute_district_metrics;

/// Fraction of T1 districts treated as "stressed" (top 20% by AUPS).
const STRESS_QUANTILE: f64 = 0.8;

/// Validate the pressure signal against held-out history.
///
/// Biometric rows are sorted by date (undated rows last) and split at the
/// midpoint row index into T1 and T2. District metrics computed on T1 against
/// the full enrolment table flag the top-quintile districts as stressed; the
/// outcome compares mean T2 volume between the stressed set and the rest
/// (left-join semantics: a T2 district missing from the stressed set is
/// "normal").
///
/// Degraded inputs produce typed outcomes instead of errors: a table without
/// dates reports [`BacktestOutcome::NoDateColumn`], an empty half reports
/// [`BacktestOutcome::InsufficientSplit`]. Deterministic and side-effect free.
pub fn run_backtest(bio: &BiometricTable, enrol: &EnrolmentTable) -> BacktestOutcome {
    if !bio.has_dates() {
        return BacktestOutcome::NoDateColumn;
    }

    let mut sorted = bio.rows.clone();
    // Stable sort; rows without dates go last.
    sorted.sort_by_key(|r| (r.date.is_none(), r.date));

    let mid = sorted.len() / 2;
    let (t1_rows, t2_rows) = sorted.split_at(mid);
    if t1_rows.is_empty() || t2_rows.is_empty() {
        return BacktestOutcome::InsufficientSplit;
    }

    let t1 = BiometricTable::new(t1_rows.to_vec());
    let t1_metrics = compute_district_metrics(&t1, enrol);

    let threshold = percentile(
        &t1_metrics.iter().map(|m| m.aups).collect::<Vec<_>>(),
        STRESS_QUANTILE,
    );
    let stressed: BTreeSet<DistrictKey> = t1_metrics
        .iter()
        .filter(|m| m.aups >= threshold)
        .map(|m| (m.state.clone(), m.district.clone()))
        .collect();
    debug!(
        stressed = stressed.len(),
        total = t1_metrics.len(),
        threshold,
        "flagged T1 high-pressure districts"
    );

    let mut t2_totals: BTreeMap<DistrictKey, i64> = BTreeMap::new();
    for row in t2_rows {
        *t2_totals
            .entry((row.state.clone(), row.district.clone()))
            .or_insert(0) += row.total_updates;
    }

    let (mut stressed_sum, mut stressed_n) = (0i64, 0usize);
    let (mut normal_sum, mut normal_n) = (0i64, 0usize);
    for (key, total) in &t2_totals {
        if stressed.contains(key) {
            stressed_sum += total;
            stressed_n += 1;
        } else {
            normal_sum += total;
            normal_n += 1;
        }
    }

    let stressed_avg_t2 = mean(stressed_sum, stressed_n);
    let normal_avg_t2 = mean(normal_sum, normal_n);

    // NaN comparisons are false, so an empty partition never validates.
    let is_valid = stressed_avg_t2 > normal_avg_t2;
    let lift = if normal_avg_t2 > 0.0 {
        stressed_avg_t2 / normal_avg_t2
    } else {
        1.0
    };

    BacktestOutcome::Evaluated(ValidationResult {
        is_valid,
        stressed_avg_t2,
        normal_avg_t2,
        lift,
    })
}

/// Mean of an aggregated partition; NaN when the partition is empty.
fn mean(sum: i64, n: usize) -> f64 {
    if n == 0 {
        f64::NAN
    } else {
        sum as f64 / n as f64
    }
}

/// Linear-interpolation percentile over unsorted values (the convention
/// pandas `quantile` uses). NaN for an empty slice.
fn percentile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = q * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    if lower == upper {
        sorted[lower]
    } else {
        let frac = rank - lower as f64;
        sorted[lower] + frac * (sorted[upper] - sorted[lower])
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aups_core::BiometricRecord;
    use chrono::NaiveDate;

    fn bio(district: &str, day: u32, total: i64) -> BiometricRecord {
        BiometricRecord {
            state: "Kerala".to_string(),
            district: district.to_string(),
            date: Some(NaiveDate::from_ymd_opt(2025, 3, day).unwrap()),
            age_5_17: total,
            age_17_plus: 0,
            total_updates: total,
            child_teen_share: None,
        }
    }

    /// Two districts, two halves of the month. "Hot" dominates the early
    /// volume (stressed in T1); its later volume relative to "Cold" is
    /// controlled by the caller.
    fn history(hot_t2: i64, cold_t2: i64) -> BiometricTable {
        let mut rows = Vec::new();
        for day in 1..=10 {
            rows.push(bio("Hot", day, 100));
            rows.push(bio("Cold", day, 1));
        }
        for day in 16..=25 {
            rows.push(bio("Hot", day, hot_t2));
            rows.push(bio("Cold", day, cold_t2));
        }
        BiometricTable::new(rows)
    }

    #[test]
    fn test_no_dates_reports_no_date_column() {
        let mut row = bio("Hot", 1, 10);
        row.date = None;
        let table = BiometricTable::new(vec![row]);
        assert_eq!(
            run_backtest(&table, &EnrolmentTable::empty()),
            BacktestOutcome::NoDateColumn
        );
        assert_eq!(
            run_backtest(&BiometricTable::empty(), &EnrolmentTable::empty()),
            BacktestOutcome::NoDateColumn
        );
    }

    #[test]
    fn test_single_row_reports_insufficient_split() {
        let table = BiometricTable::new(vec![bio("Hot", 1, 10)]);
        assert_eq!(
            run_backtest(&table, &EnrolmentTable::empty()),
            BacktestOutcome::InsufficientSplit
        );
    }

    #[test]
    fn test_predictive_signal_validates_with_lift() {
        // Hot stays hot in T2: the signal should validate with lift > 1.
        let table = history(200, 1);
        let outcome = run_backtest(&table, &EnrolmentTable::empty());
        let result = outcome.result().expect("backtest should evaluate");
        assert!(result.is_valid);
        assert!(result.lift > 1.0);
        assert!(result.stressed_avg_t2 > result.normal_avg_t2);
    }

    #[test]
    fn test_reversed_volumes_invalidate() {
        // Hot goes quiet while Cold spikes: the T1 signal mispredicts.
        let table = history(1, 500);
        let outcome = run_backtest(&table, &EnrolmentTable::empty());
        let result = outcome.result().expect("backtest should evaluate");
        assert!(!result.is_valid);
        assert!(result.lift < 1.0);
    }

    #[test]
    fn test_district_absent_from_stressed_set_counts_as_normal() {
        // "New" only appears in T2; left-join semantics put it in the
        // normal partition.
        let mut table = history(200, 1);
        for day in 16..=25 {
            table.rows.push(bio("New", day, 5));
        }
        let outcome = run_backtest(&table, &EnrolmentTable::empty());
        let result = outcome.result().expect("backtest should evaluate");
        // Normal mean now averages Cold and New.
        assert!(result.normal_avg_t2 > 10.0);
        assert!(result.is_valid);
    }

    #[test]
    fn test_deterministic() {
        let table = history(50, 20);
        let enrol = EnrolmentTable::empty();
        assert_eq!(run_backtest(&table, &enrol), run_backtest(&table, &enrol));
    }

    #[test]
    fn test_percentile_linear_interpolation() {
        let values = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        assert_eq!(percentile(&values, 0.8), 4.2);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 1.0), 5.0);
        assert!(percentile(&[], 0.8).is_nan());
    }
}
