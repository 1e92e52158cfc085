//! AUPS Core - Record and Metric Types
//!
//! Pure data structures with no pipeline logic. All other crates depend on
//! this. Tables are plain in-memory row collections; every analytics pass
//! rebuilds its outputs from scratch (no caching, no incremental state).

pub mod config;
pub mod error;
pub mod metrics;
pub mod record;

pub use config::IngestConfig;
pub use error::{AupsError, AupsResult, ConfigError, IngestError};
pub use metrics::{BacktestOutcome, DistrictMetric, ForecastPoint, ValidationResult};
pub use record::{
    BiometricRecord, BiometricTable, DemographicRecord, DemographicTable, DistrictKey,
    EnrolmentRecord, EnrolmentTable,
};
