//! Feature deriver: per-row totals and cohort shares.

use aups_core::{BiometricTable, DemographicTable};

/// Fill the derived columns of a biometric table in place:
/// `total_updates = age_5_17 + age_17_plus` and the child/teen share of that
/// total. The share is `None` when the total is zero.
///
/// An empty table passes through unchanged. The enrolment table is never
/// touched by feature derivation.
pub fn derive_biometric_features(table: &mut BiometricTable) {
    for row in &mut table.rows {
        row.total_updates = row.age_5_17 + row.age_17_plus;
        row.child_teen_share = if row.total_updates > 0 {
            Some(row.age_5_17 as f64 / row.total_updates as f64)
        } else {
            None
        };
    }
}

/// Symmetric derivation for a demographic table: `total_updates` and the
/// adult (17+) share, `None` when the total is zero.
pub fn derive_demographic_features(table: &mut DemographicTable) {
    for row in &mut table.rows {
        row.total_updates = row.age_5_17 + row.age_17_plus;
        row.adult_share = if row.total_updates > 0 {
            Some(row.age_17_plus as f64 / row.total_updates as f64)
        } else {
            None
        };
    }
}

// =============================================================================
// TESTS
// =============================================================================
