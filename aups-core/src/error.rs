//! Error types for AUPS operations.
//!
//! The analytics core never fails: missing input degrades to empty output and
//! guarded divisions produce documented fallbacks. Errors here cover the
//! edges of the system, ingestion and configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Record loader errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum IngestError {
    #[error("Cannot read directory {path}: {reason}")]
    DirectoryUnreadable { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {reason}")]
    FileRead { path: PathBuf, reason: String },

    #[error("Malformed CSV in {path}: {reason}")]
    MalformedCsv { path: PathBuf, reason: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Configured {field} is not a directory: {path}")]
    DirectoryNotFound { field: String, path: PathBuf },

    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Master error type for all AUPS errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AupsError {
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type alias for AUPS operations.
pub type AupsResult<T> = Result<T, AupsError>;

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ingest_error_display_directory_unreadable() {
        let err = IngestError::DirectoryUnreadable {
            path: PathBuf::from("/data/bio"),
            reason: "permission denied".to_string(),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("Cannot read directory"));
        assert!(msg.contains("/data/bio"));
        assert!(msg.contains("permission denied"));
    }

    #[test]
    fn test_config_error_display_directory_not_found() {
        let err = ConfigError::DirectoryNotFound {
            field: "enrolment_dir".to_string(),
            path: PathBuf::from("/missing"),
        };
        let msg = format!("{}", err);
        assert!(msg.contains("enrolment_dir"));
        assert!(msg.contains("/missing"));
    }

    #[test]
    fn test_aups_error_from_variants() {
        let ingest = AupsError::from(IngestError::FileRead {
            path: PathBuf::from("a.csv"),
            reason: "io".to_string(),
        });
        assert!(matches!(ingest, AupsError::Ingest(_)));

        let config = AupsError::from(ConfigError::InvalidValue {
            field: "horizon".to_string(),
            value: "-1".to_string(),
            reason: "must be positive".to_string(),
        });
        assert!(matches!(config, AupsError::Config(_)));
    }
}
