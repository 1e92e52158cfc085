//! Configuration types.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Source directories for the three dataset categories.
///
/// Passed explicitly to the loader at construction time; there is no
/// process-wide path state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub biometric_dir: PathBuf,
    pub demographic_dir: PathBuf,
    pub enrolment_dir: PathBuf,
}

impl IngestConfig {
    /// Config for the conventional layout: one data root holding the three
    /// category subdirectories as exported by the upstream API dumps.
    pub fn for_data_root(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            biometric_dir: root.join("api_data_aadhar_biometric"),
            demographic_dir: root.join("api_data_aadhar_demographic"),
            enrolment_dir: root.join("api_data_aadhar_enrolment"),
        }
    }

    /// Reject configs whose directories are not directories on disk.
    /// A missing directory is a setup mistake worth reporting early, while
    /// an empty one merely produces empty tables downstream.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, dir) in [
            ("biometric_dir", &self.biometric_dir),
            ("demographic_dir", &self.demographic_dir),
            ("enrolment_dir", &self.enrolment_dir),
        ] {
            if !dir.is_dir() {
                return Err(ConfigError::DirectoryNotFound {
                    field: field.to_string(),
                    path: dir.clone(),
                });
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_data_root_builds_category_dirs() {
        let config = IngestConfig::for_data_root("/data/aadhaar");
        assert_eq!(
            config.biometric_dir,
            PathBuf::from("/data/aadhaar/api_data_aadhar_biometric")
        );
        assert_eq!(
            config.enrolment_dir,
            PathBuf::from("/data/aadhaar/api_data_aadhar_enrolment")
        );
    }

    #[test]
    fn test_validate_rejects_missing_directory() {
        let config = IngestConfig::for_data_root("/nonexistent/aadhaar");
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::DirectoryNotFound { ref field, .. } if field == "biometric_dir"));
    }
}
