//! Source table rows: biometric updates, demographic updates, enrolments.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Key identifying a district within a state.
pub type DistrictKey = (String, String);

// ============================================================================
// ROWS
// ============================================================================

/// One row of the biometric-update extract.
///
/// `total_updates` and `child_teen_share` are derived columns: zero/`None`
/// straight out of the loader, filled in by the feature deriver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BiometricRecord {
    pub state: String,
    pub district: String,
    /// Report date; `None` when the source value was absent or unparsable.
    /// Undated rows are excluded from every time-ordered computation.
    pub date: Option<NaiveDate>,
    /// Updates for the 5-17 cohort (mandatory lifecycle updates).
    pub age_5_17: i64,
    /// Updates for the 17+ cohort.
    pub age_17_plus: i64,
    /// Derived: `age_5_17 + age_17_plus`.
    #[serde(default)]
    pub total_updates: i64,
    /// Derived: share of updates from the 5-17 cohort.
    /// `None` when the total is zero (undefined, not an error).
    #[serde(default)]
    pub child_teen_share: Option<f64>,
}

/// One row of the demographic-update extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemographicRecord {
    pub state: String,
    pub district: String,
    pub date: Option<NaiveDate>,
    pub age_5_17: i64,
    pub age_17_plus: i64,
    /// Derived: `age_5_17 + age_17_plus`.
    #[serde(default)]
    pub total_updates: i64,
    /// Derived: adult (17+) share of updates, `None` when the total is zero.
    /// A high share is read as an economic-migration signal.
    #[serde(default)]
    pub adult_share: Option<f64>,
}

/// One row of the enrolment extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrolmentRecord {
    pub state: String,
    pub district: String,
    pub date: Option<NaiveDate>,
    pub age_0_5: i64,
    pub age_5_17: i64,
    pub age_18_plus: i64,
}

impl EnrolmentRecord {
    /// Total enrolments across all age bands.
    pub fn total(&self) -> i64 {
        self.age_0_5 + self.age_5_17 + self.age_18_plus
    }
}

// ============================================================================
// TABLES
// ============================================================================

macro_rules! table_impl {
    ($table:ident, $row:ident) => {
        impl $table {
            /// Wrap rows in a table.
            pub fn new(rows: Vec<$row>) -> Self {
                Self { rows }
            }

            /// Table with no rows.
            pub fn empty() -> Self {
                Self { rows: Vec::new() }
            }

            pub fn is_empty(&self) -> bool {
                self.rows.is_empty()
            }

            pub fn len(&self) -> usize {
                self.rows.len()
            }

            /// True when at least one row carries a date. Tables where this
            /// is false degrade to the documented defaults in every
            /// time-ordered computation (zero growth, empty forecast,
            /// no-date backtest outcome).
            pub fn has_dates(&self) -> bool {
                self.rows.iter().any(|r| r.date.is_some())
            }

            /// Derived view containing only rows for one state.
            pub fn filter_state(&self, state: &str) -> Self {
                Self {
                    rows: self
                        .rows
                        .iter()
                        .filter(|r| r.state == state)
                        .cloned()
                        .collect(),
                }
            }

            /// Distinct states present, sorted.
            pub fn states(&self) -> Vec<String> {
                let mut states: Vec<String> =
                    self.rows.iter().map(|r| r.state.clone()).collect();
                states.sort();
                states.dedup();
                states
            }
        }
    };
}

/// All biometric-update rows for one analysis pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BiometricTable {
    pub rows: Vec<BiometricRecord>,
}

/// All demographic-update rows for one analysis pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DemographicTable {
    pub rows: Vec<DemographicRecord>,
}

/// All enrolment rows for one analysis pass.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EnrolmentTable {
    pub rows: Vec<EnrolmentRecord>,
}

table_impl!(BiometricTable, BiometricRecord);
table_impl!(DemographicTable, DemographicRecord);
table_impl!(EnrolmentTable, EnrolmentRecord);

// =============================================================================
// TESTS
// =============================================================================
