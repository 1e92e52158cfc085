//! District metrics engine: the Aadhaar Update Pressure Score (AUPS).

use std::collections::BTreeMap;

use aups_core::{BiometricTable, DistrictKey, DistrictMetric, EnrolmentTable};
use chrono::Datelike;
use tracing::debug;

/// Scale factor applied to the raw density-times-momentum product.
const AUPS_SCALE: f64 = 1000.0;

/// Bounds applied to the raw growth rate before it feeds the score.
const GROWTH_CLAMP: (f64, f64) = (-0.5, 2.0);

/// Compute one `DistrictMetric` row per (state, district), sorted by
/// descending raw AUPS (ties broken by district key so repeated runs are
/// byte-identical).
///
/// Expects the biometric table to have been through the feature deriver
/// (`total_updates` populated). The steps:
///
/// 1. Sum biometric updates and enrolment counters per district; enrolment
///    is floored at 1, and districts absent from the enrolment table get 1.
/// 2. Growth rate: each district's dated rows are split at the mean date of
///    the whole input (one global split point, not per-district), summing
///    updates strictly after vs at-or-before it. Undated rows count toward
///    totals but toward neither half. No dated rows anywhere means zero
///    growth for every district.
/// 3. `aups = density * (1 + clamp(growth, -0.5, 2.0)) * 1000`, normalized
///    to 0-100 against the maximum in this output (all zero when max <= 0).
///
/// Pure aggregation: deterministic and idempotent over identical inputs.
pub fn compute_district_metrics(
    bio: &BiometricTable,
    enrol: &EnrolmentTable,
) -> Vec<DistrictMetric> {
    if bio.is_empty() {
        return Vec::new();
    }

    let mut update_totals: BTreeMap<DistrictKey, i64> = BTreeMap::new();
    for row in &bio.rows {
        *update_totals
            .entry((row.state.clone(), row.district.clone()))
            .or_insert(0) += row.total_updates;
    }

    let mut enrol_totals: BTreeMap<DistrictKey, i64> = BTreeMap::new();
    for row in &enrol.rows {
        *enrol_totals
            .entry((row.state.clone(), row.district.clone()))
            .or_insert(0) += row.total();
    }

    let growth_rates = growth_by_district(bio);
    debug!(districts = update_totals.len(), "aggregated district totals");

    let mut metrics: Vec<DistrictMetric> = update_totals
        .into_iter()
        .map(|((state, district), total_updates)| {
            let key = (state, district);
            // Floor at 1: avoids division by zero, at the cost of deflating
            // density for districts with no enrolment data.
            let total_enrolment = enrol_totals.get(&key).copied().unwrap_or(0).max(1);
            let growth_rate = growth_rates.get(&key).copied().unwrap_or(0.0);

            let update_density = total_updates as f64 / total_enrolment as f64;
            let growth_multiplier = 1.0 + growth_rate.clamp(GROWTH_CLAMP.0, GROWTH_CLAMP.1);
            let aups = update_density * growth_multiplier * AUPS_SCALE;

            DistrictMetric {
                state: key.0,
                district: key.1,
                total_updates,
                total_enrolment,
                growth_rate,
                update_density,
                growth_multiplier,
                aups,
                aups_normalized: 0.0,
            }
        })
        .collect();

    metrics.sort_by(|a, b| {
        b.aups
            .partial_cmp(&a.aups)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| (&a.state, &a.district).cmp(&(&b.state, &b.district)))
    });

    // Normalization is relative to whatever set of districts is in scope,
    // so it is recomputed here on every call.
    let max_aups = metrics.first().map(|m| m.aups).unwrap_or(0.0);
    for metric in &mut metrics {
        metric.aups_normalized = if max_aups > 0.0 {
            metric.aups / max_aups * 100.0
        } else {
            0.0
        };
    }

    metrics
}

/// Half-over-half growth per district around the global mean date.
/// Returns an empty map when no row carries a date.
fn growth_by_district(bio: &BiometricTable) -> BTreeMap<DistrictKey, f64> {
    let dated: Vec<_> = bio.rows.iter().filter(|r| r.date.is_some()).collect();
    if dated.is_empty() {
        return BTreeMap::new();
    }

    let mean_days = dated
        .iter()
        .map(|r| r.date.unwrap().num_days_from_ce() as f64)
        .sum::<f64>()
        / dated.len() as f64;

    // (recent, past) sums per district, split strictly-after vs at-or-before.
    let mut halves: BTreeMap<DistrictKey, (i64, i64)> = BTreeMap::new();
    for row in dated {
        let entry = halves
            .entry((row.state.clone(), row.district.clone()))
            .or_insert((0, 0));
        if (row.date.unwrap().num_days_from_ce() as f64) > mean_days {
            entry.0 += row.total_updates;
        } else {
            entry.1 += row.total_updates;
        }
    }

    halves
        .into_iter()
        .map(|(key, (recent, past))| {
            let growth = if past > 0 {
                (recent - past) as f64 / past as f64
            } else {
                0.0
            };
            (key, growth)
        })
        .collect()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use aups_core::{BiometricRecord, EnrolmentRecord};
    use chrono::NaiveDate;

    fn bio(state: &str, district: &str, day: Option<u32>, total: i64) -> BiometricRecord {
        BiometricRecord {
            state: state.to_string(),
            district: district.to_string(),
            date: day.map(|d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap()),
            age_5_17: total,
            age_17_plus: 0,
            total_updates: total,
            child_teen_share: None,
        }
    }

    fn enrol(state: &str, district: &str, a: i64, b: i64, c: i64) -> EnrolmentRecord {
        EnrolmentRecord {
            state: state.to_string(),
            district: district.to_string(),
            date: None,
            age_0_5: a,
            age_5_17: b,
            age_18_plus: c,
        }
    }

    #[test]
    fn test_single_district_worked_example() {
        // enrolment 10+10+10 = 30, updates 60 -> density 2.0, zero growth
        // -> AUPS 2000, and the only district normalizes to 100.
        let bio_table = BiometricTable::new(vec![bio("Kerala", "Idukki", None, 60)]);
        let enrol_table = EnrolmentTable::new(vec![enrol("Kerala", "Idukki", 10, 10, 10)]);

        let metrics = compute_district_metrics(&bio_table, &enrol_table);
        assert_eq!(metrics.len(), 1);
        let m = &metrics[0];
        assert_eq!(m.total_enrolment, 30);
        assert_eq!(m.update_density, 2.0);
        assert_eq!(m.growth_rate, 0.0);
        assert_eq!(m.aups, 2000.0);
        assert_eq!(m.aups_normalized, 100.0);
    }

    #[test]
    fn test_missing_enrolment_floors_to_one() {
        let bio_table = BiometricTable::new(vec![bio("Kerala", "Idukki", None, 5)]);
        let metrics = compute_district_metrics(&bio_table, &EnrolmentTable::empty());
        assert_eq!(metrics[0].total_enrolment, 1);
        assert_eq!(metrics[0].update_density, 5.0);
    }

    #[test]
    fn test_growth_splits_at_global_mean_date() {
        // Days 1 and 11: mean is day 6. Past = 10, recent = 30 -> growth 2.0.
        let bio_table = BiometricTable::new(vec![
            bio("Kerala", "Idukki", Some(1), 10),
            bio("Kerala", "Idukki", Some(11), 30),
        ]);
        let enrol_table = EnrolmentTable::new(vec![enrol("Kerala", "Idukki", 1, 0, 0)]);

        let metrics = compute_district_metrics(&bio_table, &enrol_table);
        assert_eq!(metrics[0].growth_rate, 2.0);
        assert_eq!(metrics[0].growth_multiplier, 3.0);
    }

    #[test]
    fn test_growth_clamped_before_scoring() {
        // Past 1, recent 100 -> raw growth 99, clamped to 2.0 in the score.
        let bio_table = BiometricTable::new(vec![
            bio("Kerala", "Idukki", Some(1), 1),
            bio("Kerala", "Idukki", Some(21), 100),
        ]);
        let enrol_table = EnrolmentTable::new(vec![enrol("Kerala", "Idukki", 1, 0, 0)]);

        let metrics = compute_district_metrics(&bio_table, &enrol_table);
        assert_eq!(metrics[0].growth_rate, 99.0);
        assert_eq!(metrics[0].growth_multiplier, 3.0);
    }

    #[test]
    fn test_zero_past_volume_means_zero_growth() {
        let bio_table = BiometricTable::new(vec![
            bio("Kerala", "Idukki", Some(1), 0),
            bio("Kerala", "Idukki", Some(21), 100),
        ]);
        let enrol_table = EnrolmentTable::new(vec![enrol("Kerala", "Idukki", 1, 0, 0)]);

        let metrics = compute_district_metrics(&bio_table, &enrol_table);
        assert_eq!(metrics[0].growth_rate, 0.0);
    }

    #[test]
    fn test_undated_table_gets_zero_growth_everywhere() {
        let bio_table = BiometricTable::new(vec![
            bio("Kerala", "Idukki", None, 10),
            bio("Bihar", "Gaya", None, 20),
        ]);
        let metrics = compute_district_metrics(&bio_table, &EnrolmentTable::empty());
        assert!(metrics.iter().all(|m| m.growth_rate == 0.0));
    }

    #[test]
    fn test_sorted_descending_with_max_normalized_to_100() {
        let bio_table = BiometricTable::new(vec![
            bio("Kerala", "Idukki", None, 10),
            bio("Bihar", "Gaya", None, 40),
        ]);
        let enrol_table = EnrolmentTable::new(vec![
            enrol("Kerala", "Idukki", 10, 0, 0),
            enrol("Bihar", "Gaya", 10, 0, 0),
        ]);

        let metrics = compute_district_metrics(&bio_table, &enrol_table);
        assert_eq!(metrics[0].district, "Gaya");
        assert_eq!(metrics[0].aups_normalized, 100.0);
        assert!(metrics[1].aups_normalized < 100.0);
        assert!(metrics.windows(2).all(|w| w[0].aups >= w[1].aups));
    }

    #[test]
    fn test_all_zero_scores_normalize_to_zero() {
        let bio_table = BiometricTable::new(vec![bio("Kerala", "Idukki", None, 0)]);
        let enrol_table = EnrolmentTable::new(vec![enrol("Kerala", "Idukki", 10, 0, 0)]);

        let metrics = compute_district_metrics(&bio_table, &enrol_table);
        assert_eq!(metrics[0].aups, 0.0);
        assert_eq!(metrics[0].aups_normalized, 0.0);
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        let metrics = compute_district_metrics(&BiometricTable::empty(), &EnrolmentTable::empty());
        assert!(metrics.is_empty());
    }

    #[test]
    fn test_idempotent_over_identical_inputs() {
        let bio_table = BiometricTable::new(vec![
            bio("Kerala", "Idukki", Some(1), 10),
            bio("Kerala", "Idukki", Some(11), 30),
            bio("Bihar", "Gaya", Some(5), 25),
        ]);
        let enrol_table = EnrolmentTable::new(vec![
            enrol("Kerala", "Idukki", 10, 5, 5),
            enrol("Bihar", "Gaya", 3, 3, 4),
        ]);

        let first = compute_district_metrics(&bio_table, &enrol_table);
        let second = compute_district_metrics(&bio_table, &enrol_table);
        assert_eq!(first, second);
    }
}
