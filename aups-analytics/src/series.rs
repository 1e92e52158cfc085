//! Time-series and ranking helpers behind the operational report:
//! daily trends, cohort composition, mobility hotspots, alert inputs.

use std::collections::BTreeMap;

use aups_core::{BiometricTable, DemographicTable, DistrictKey, DistrictMetric};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Daily child/teen vs adult update volumes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CohortPoint {
    pub date: NaiveDate,
    pub child_teen: i64,
    pub adult: i64,
}

/// Cohort breakdown of total biometric update volume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdateComposition {
    pub child_teen: i64,
    pub adult: i64,
    pub child_teen_pct: f64,
    pub adult_pct: f64,
}

/// Aggregate demographic-update mobility signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MobilitySignal {
    pub total_updates: i64,
    /// Adult share of all demographic updates, as a percentage. A high share
    /// reads as economic migration rather than child-record correction.
    pub adult_share_pct: f64,
}

/// Total updates per date, ascending. Undated rows are skipped.
pub fn daily_totals(bio: &BiometricTable) -> Vec<(NaiveDate, i64)> {
    let mut daily: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for row in &bio.rows {
        if let Some(date) = row.date {
            *daily.entry(date).or_insert(0) += row.total_updates;
        }
    }
    daily.into_iter().collect()
}

/// Per-date cohort volumes, ascending by date.
pub fn daily_cohort_totals(bio: &BiometricTable) -> Vec<CohortPoint> {
    let mut daily: BTreeMap<NaiveDate, (i64, i64)> = BTreeMap::new();
    for row in &bio.rows {
        if let Some(date) = row.date {
            let entry = daily.entry(date).or_insert((0, 0));
            entry.0 += row.age_5_17;
            entry.1 += row.age_17_plus;
        }
    }
    daily
        .into_iter()
        .map(|(date, (child_teen, adult))| CohortPoint {
            date,
            child_teen,
            adult,
        })
        .collect()
}

/// Trailing rolling mean with a minimum period of one: each position
/// averages up to `window` values ending there, so the head of the series
/// still gets a (shorter-window) value.
pub fn rolling_mean(values: &[i64], window: usize) -> Vec<f64> {
    assert!(window > 0, "rolling window must be positive");
    values
        .iter()
        .enumerate()
        .map(|(i, _)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &values[start..=i];
            slice.iter().sum::<i64>() as f64 / slice.len() as f64
        })
        .collect()
}

/// The date with the highest total update volume (earliest date wins ties),
/// or `None` when nothing is dated.
pub fn peak_activity(bio: &BiometricTable) -> Option<(NaiveDate, i64)> {
    daily_totals(bio)
        .into_iter()
        .reduce(|best, cur| if cur.1 > best.1 { cur } else { best })
}

/// States ranked by total biometric update volume, descending, top `n`.
pub fn top_states_by_updates(bio: &BiometricTable, n: usize) -> Vec<(String, i64)> {
    let mut totals: BTreeMap<String, i64> = BTreeMap::new();
    for row in &bio.rows {
        *totals.entry(row.state.clone()).or_insert(0) += row.total_updates;
    }
    rank_desc(totals, n)
}

/// Districts ranked by total biometric update volume, descending, top `n`.
pub fn top_districts_by_updates(bio: &BiometricTable, n: usize) -> Vec<(DistrictKey, i64)> {
    let mut totals: BTreeMap<DistrictKey, i64> = BTreeMap::new();
    for row in &bio.rows {
        *totals
            .entry((row.state.clone(), row.district.clone()))
            .or_insert(0) += row.total_updates;
    }
    rank_desc(totals, n)
}

/// Districts ranked by adult demographic-update volume (mobility hotspots).
pub fn top_mobility_districts(demo: &DemographicTable, n: usize) -> Vec<(DistrictKey, i64)> {
    let mut totals: BTreeMap<DistrictKey, i64> = BTreeMap::new();
    for row in &demo.rows {
        *totals
            .entry((row.state.clone(), row.district.clone()))
            .or_insert(0) += row.age_17_plus;
    }
    rank_desc(totals, n)
}

/// Cohort composition of biometric updates; `None` when total volume is zero.
pub fn update_composition(bio: &BiometricTable) -> Option<UpdateComposition> {
    let child_teen: i64 = bio.rows.iter().map(|r| r.age_5_17).sum();
    let adult: i64 = bio.rows.iter().map(|r| r.age_17_plus).sum();
    let total = child_teen + adult;
    if total == 0 {
        return None;
    }
    Some(UpdateComposition {
        child_teen,
        adult,
        child_teen_pct: child_teen as f64 / total as f64 * 100.0,
        adult_pct: adult as f64 / total as f64 * 100.0,
    })
}

/// Aggregate mobility signal over a demographic table; `None` when total
/// update volume is zero.
pub fn mobility_signal(demo: &DemographicTable) -> Option<MobilitySignal> {
    let total_updates: i64 = demo.rows.iter().map(|r| r.total_updates).sum();
    if total_updates == 0 {
        return None;
    }
    let adult: i64 = demo.rows.iter().map(|r| r.age_17_plus).sum();
    Some(MobilitySignal {
        total_updates,
        adult_share_pct: adult as f64 / total_updates as f64 * 100.0,
    })
}

/// Districts whose normalized AUPS exceeds `threshold` (red-flag input).
pub fn critical_districts(metrics: &[DistrictMetric], threshold: f64) -> Vec<&DistrictMetric> {
    metrics
        .iter()
        .filter(|m| m.aups_normalized > threshold)
        .collect()
}

/// Mean normalized AUPS per state, descending by mean.
pub fn state_mean_aups(metrics: &[DistrictMetric]) -> Vec<(String, f64)> {
    let mut sums: BTreeMap<String, (f64, usize)> = BTreeMap::new();
    for m in metrics {
        let entry = sums.entry(m.state.clone()).or_insert((0.0, 0));
        entry.0 += m.aups_normalized;
        entry.1 += 1;
    }
    let mut means: Vec<(String, f64)> = sums
        .into_iter()
        .map(|(state, (sum, n))| (state, sum / n as f64))
        .collect();
    means.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    means
}

fn rank_desc<K: Ord>(totals: BTreeMap<K, i64>, n: usize) -> Vec<(K, i64)> {
    let mut ranked: Vec<(K, i64)> = totals.into_iter().collect();
    // Stable sort on the count keeps the key order for ties.
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(n);
    ranked
}

// =============================================================================
// TESTS
// =============================================================================
