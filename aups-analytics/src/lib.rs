//! AUPS Analytics - Pressure Scoring Pipeline
//!
//! Pure, single-pass batch transforms over `aups-core` tables: feature
//! derivation, district pressure metrics (AUPS), short-horizon demand
//! forecasting, and split-half signal validation. Every function here is
//! deterministic and side-effect free; missing or undated input degrades to
//! an empty or default result instead of an error.

pub mod backtest;
pub mod district;
pub mod features;
pub mod forecast;
pub mod series;

pub use backtest::run_backtest;
pub use district::compute_district_metrics;
pub use features::{derive_biometric_features, derive_demographic_features};
pub use forecast::{generate_forecast, DEFAULT_HORIZON_DAYS, TREND_WINDOW};
