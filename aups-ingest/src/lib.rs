//! AUPS Ingest - Record Loader
//!
//! Turns a directory of per-file CSV extracts into one typed table per
//! dataset category. Headers are normalized (trimmed, lowercased) before
//! matching, dates are parsed from the upstream `DD-MM-YYYY` format with
//! unparsable values becoming `None`, and numeric counters default to 0 on
//! blank or garbage input. A file that cannot be read or decoded is logged
//! and skipped; only an unreadable directory is an error.

use std::fs::File;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use tracing::{error, info, warn};

use aups_core::{
    AupsResult, BiometricRecord, BiometricTable, DemographicRecord, DemographicTable,
    EnrolmentRecord, EnrolmentTable, IngestConfig, IngestError,
};

/// Upstream date format.
const DATE_FORMAT: &str = "%d-%m-%Y";

// ============================================================================
// PUBLIC LOADERS
// ============================================================================

/// Load and concatenate every biometric CSV under the configured directory.
pub fn load_biometric(config: &IngestConfig) -> AupsResult<BiometricTable> {
    let raw: Vec<RawBiometricRow> = load_rows(&config.biometric_dir, "Biometric")?;
    Ok(BiometricTable::new(
        raw.into_iter().map(RawBiometricRow::into_record).collect(),
    ))
}

/// Load and concatenate every demographic CSV under the configured directory.
pub fn load_demographic(config: &IngestConfig) -> AupsResult<DemographicTable> {
    let raw: Vec<RawDemographicRow> = load_rows(&config.demographic_dir, "Demographic")?;
    Ok(DemographicTable::new(
        raw.into_iter()
            .map(RawDemographicRow::into_record)
            .collect(),
    ))
}

/// Load and concatenate every enrolment CSV under the configured directory.
pub fn load_enrolment(config: &IngestConfig) -> AupsResult<EnrolmentTable> {
    let raw: Vec<RawEnrolmentRow> = load_rows(&config.enrolment_dir, "Enrolment")?;
    Ok(EnrolmentTable::new(
        raw.into_iter().map(RawEnrolmentRow::into_record).collect(),
    ))
}

/// Load all three dataset categories in one pass.
pub fn load_all(
    config: &IngestConfig,
) -> AupsResult<(BiometricTable, DemographicTable, EnrolmentTable)> {
    Ok((
        load_biometric(config)?,
        load_demographic(config)?,
        load_enrolment(config)?,
    ))
}

// ============================================================================
// RAW ROWS (upstream column names)
// ============================================================================

#[derive(Debug, Deserialize)]
struct RawBiometricRow {
    #[serde(default)]
    state: String,
    #[serde(default)]
    district: String,
    #[serde(default, deserialize_with = "de_date")]
    date: Option<NaiveDate>,
    #[serde(default, rename = "bio_age_5_17", deserialize_with = "de_count")]
    age_5_17: i64,
    #[serde(default, rename = "bio_age_17_", deserialize_with = "de_count")]
    age_17_plus: i64,
}

impl RawBiometricRow {
    fn into_record(self) -> BiometricRecord {
        BiometricRecord {
            state: self.state,
            district: self.district,
            date: self.date,
            age_5_17: self.age_5_17,
            age_17_plus: self.age_17_plus,
            total_updates: 0,
            child_teen_share: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawDemographicRow {
    #[serde(default)]
    state: String,
    #[serde(default)]
    district: String,
    #[serde(default, deserialize_with = "de_date")]
    date: Option<NaiveDate>,
    #[serde(default, rename = "demo_age_5_17", deserialize_with = "de_count")]
    age_5_17: i64,
    #[serde(default, rename = "demo_age_17_", deserialize_with = "de_count")]
    age_17_plus: i64,
}

impl RawDemographicRow {
    fn into_record(self) -> DemographicRecord {
        DemographicRecord {
            state: self.state,
            district: self.district,
            date: self.date,
            age_5_17: self.age_5_17,
            age_17_plus: self.age_17_plus,
            total_updates: 0,
            adult_share: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawEnrolmentRow {
    #[serde(default)]
    state: String,
    #[serde(default)]
    district: String,
    #[serde(default, deserialize_with = "de_date")]
    date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "de_count")]
    age_0_5: i64,
    #[serde(default, deserialize_with = "de_count")]
    age_5_17: i64,
    #[serde(default, rename = "age_18_greater", deserialize_with = "de_count")]
    age_18_plus: i64,
}

impl RawEnrolmentRow {
    fn into_record(self) -> EnrolmentRecord {
        EnrolmentRecord {
            state: self.state,
            district: self.district,
            date: self.date,
            age_0_5: self.age_0_5,
            age_5_17: self.age_5_17,
            age_18_plus: self.age_18_plus,
        }
    }
}

// ============================================================================
// FIELD PARSERS
// ============================================================================

/// `DD-MM-YYYY`; anything unparsable becomes `None` rather than an error.
fn de_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok())
}

/// Non-negative counter; blank or garbage values become 0.
fn de_count<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(raw.trim().parse::<i64>().unwrap_or(0).max(0))
}

// ============================================================================
// DIRECTORY SCAN
// ============================================================================

/// All `*.csv` rows in `dir`, concatenated in path order. Files that fail to
/// open or decode are logged and skipped, matching the loader's
/// nothing-is-fatal contract; only an unreadable directory propagates.
fn load_rows<T: DeserializeOwned>(dir: &Path, name: &str) -> Result<Vec<T>, IngestError> {
    info!(directory = %dir.display(), "loading {name} data");

    let entries =
        std::fs::read_dir(dir).map_err(|e| IngestError::DirectoryUnreadable {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| {
            path.extension()
                .map(|ext| ext.eq_ignore_ascii_case("csv"))
                .unwrap_or(false)
        })
        .collect();
    files.sort();

    if files.is_empty() {
        warn!(directory = %dir.display(), "no CSV files found for {name}");
        return Ok(Vec::new());
    }

    let mut rows = Vec::new();
    for path in &files {
        match read_csv(path) {
            Ok(mut file_rows) => rows.append(&mut file_rows),
            Err(err) => error!(path = %path.display(), %err, "skipping unreadable file"),
        }
    }

    info!(rows = rows.len(), files = files.len(), "loaded {name}");
    Ok(rows)
}

/// Decode one CSV file with normalized headers.
fn read_csv<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, IngestError> {
    let file = File::open(path).map_err(|e| IngestError::FileRead {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);

    // Standardize the schema: trim and lowercase headers before matching.
    let normalized: csv::StringRecord = reader
        .headers()
        .map_err(|e| IngestError::MalformedCsv {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    reader.set_headers(normalized);

    reader
        .deserialize()
        .collect::<Result<Vec<T>, csv::Error>>()
        .map_err(|e| IngestError::MalformedCsv {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}
