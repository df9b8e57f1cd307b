//! Configuration error types and validation traits.

use std::path::Path;
use thiserror::Error;

/// Errors that can occur during configuration validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Error indicating that a model weights path does not exist.
    #[error("model path does not exist: {path}")]
    ModelPathNotFound { path: std::path::PathBuf },

    /// Error indicating that a configuration is invalid.
    #[error("invalid configuration: {message}")]
    InvalidConfig { message: String },

    /// Error indicating that a configuration file could not be read or parsed.
    #[error("failed to load configuration from {path}: {message}")]
    LoadFailed {
        path: std::path::PathBuf,
        message: String,
    },
}

/// A trait for validating configuration parameters.
///
/// Implementors provide `validate`; the helper methods cover the checks
/// shared between configuration types.
pub trait ConfigValidator {
    /// Validates the configuration.
    fn validate(&self) -> Result<(), ConfigError>;

    /// Validates that a path exists and is a file.
    fn validate_model_path(&self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            Err(ConfigError::ModelPathNotFound {
                path: path.to_path_buf(),
            })
        } else if !path.is_file() {
            Err(ConfigError::InvalidConfig {
                message: format!("model path must be a file: {}", path.display()),
            })
        } else {
            Ok(())
        }
    }

    /// Validates image dimensions.
    ///
    /// Both dimensions must be greater than zero.
    fn validate_image_dimensions(&self, width: u32, height: u32) -> Result<(), ConfigError> {
        if width == 0 || height == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!(
                    "image dimensions must be greater than 0, got {}x{}",
                    width, height
                ),
            })
        } else {
            Ok(())
        }
    }

    /// Validates that a usize value is positive.
    fn validate_positive_usize(&self, value: usize, field_name: &str) -> Result<(), ConfigError> {
        if value == 0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be greater than 0", field_name),
            })
        } else {
            Ok(())
        }
    }

    /// Validates that an f32 value is positive and finite.
    fn validate_positive_f32(&self, value: f32, field_name: &str) -> Result<(), ConfigError> {
        if !value.is_finite() || value <= 0.0 {
            Err(ConfigError::InvalidConfig {
                message: format!("{} must be a finite value greater than 0, got {}", field_name, value),
            })
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    struct Checker;

    impl ConfigValidator for Checker {
        fn validate(&self) -> Result<(), ConfigError> {
            Ok(())
        }
    }

    #[test]
    fn test_validate_model_path_missing() {
        let result = Checker.validate_model_path(Path::new("/nonexistent/weights.safetensors"));
        assert!(matches!(result, Err(ConfigError::ModelPathNotFound { .. })));
    }

    #[test]
    fn test_validate_model_path_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = Checker.validate_model_path(dir.path());
        assert!(matches!(result, Err(ConfigError::InvalidConfig { .. })));
    }

    #[test]
    fn test_validate_model_path_file() {
        let file = NamedTempFile::new().unwrap();
        assert!(Checker.validate_model_path(file.path()).is_ok());
    }

    #[test]
    fn test_validate_numbers() {
        assert!(Checker.validate_image_dimensions(224, 224).is_ok());
        assert!(Checker.validate_image_dimensions(0, 224).is_err());
        assert!(Checker.validate_positive_usize(0, "num_classes").is_err());
        assert!(Checker.validate_positive_f32(f32::NAN, "scale").is_err());
        assert!(Checker.validate_positive_f32(-1.0, "scale").is_err());
        assert!(Checker.validate_positive_f32(0.5, "scale").is_ok());
    }
}
