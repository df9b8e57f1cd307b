//! Service configuration.
//!
//! [`ServerConfig`] collects everything the binary needs to start: the
//! listener address, the weights file, the compute device, HTTP limits, and
//! the preprocessing and model hyper-parameters. Values come from built-in
//! defaults, an optional JSON file, and finally command line overrides.

use super::errors::{ConfigError, ConfigValidator};
use crate::core::device::DeviceSpec;
use crate::models::classification::ResNetLstmConfig;
use crate::processors::PreprocessConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default weights file name, resolved relative to the working directory.
pub const DEFAULT_WEIGHTS_PATH: &str = "model_max_state.pth";

/// Configuration for the classification server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Interface to bind.
    pub host: String,
    /// TCP port to bind.
    pub port: u16,
    /// Path to the model weights (`.safetensors`, `.pth` or `.pt`).
    pub weights_path: PathBuf,
    /// Compute device selection.
    pub device: DeviceSpec,
    /// Per-request timeout in seconds.
    pub request_timeout_secs: u64,
    /// Maximum accepted request body size in bytes.
    pub max_body_bytes: usize,
    /// Image preprocessing parameters.
    pub preprocess: PreprocessConfig,
    /// Model hyper-parameters.
    pub model: ResNetLstmConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            weights_path: PathBuf::from(DEFAULT_WEIGHTS_PATH),
            device: DeviceSpec::Auto,
            request_timeout_secs: 30,
            max_body_bytes: 16 * 1024 * 1024,
            preprocess: PreprocessConfig::default(),
            model: ResNetLstmConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads a configuration from a JSON file.
    ///
    /// Missing fields fall back to their defaults.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        serde_json::from_str(&contents).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Address string handed to the TCP listener.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

impl ConfigValidator for ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::InvalidConfig {
                message: "host must not be empty".to_string(),
            });
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig {
                message: "request_timeout_secs must be greater than 0".to_string(),
            });
        }
        self.validate_positive_usize(self.max_body_bytes, "max_body_bytes")?;
        self.preprocess.validate()?;
        self.model.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults_are_valid() {
        let config = ServerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_addr(), "0.0.0.0:8000");
        assert_eq!(config.model.num_classes, 31);
        assert_eq!(config.preprocess.input_shape, (224, 224));
    }

    #[test]
    fn test_from_path_partial_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"port": 9100, "device": "cpu", "model": {{"num_classes": 10}}}}"#
        )
        .unwrap();

        let config = ServerConfig::from_path(file.path()).unwrap();
        assert_eq!(config.port, 9100);
        assert_eq!(config.device, DeviceSpec::Cpu);
        assert_eq!(config.model.num_classes, 10);
        assert_eq!(config.model.lstm_hidden, 128);
        assert_eq!(config.host, "0.0.0.0");
    }

    #[test]
    fn test_from_path_invalid_json() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{{not json").unwrap();
        let result = ServerConfig::from_path(file.path());
        assert!(matches!(result, Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn test_from_path_missing_file() {
        let result = ServerConfig::from_path("/nonexistent/server.json");
        assert!(matches!(result, Err(ConfigError::LoadFailed { .. })));
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let config = ServerConfig {
            request_timeout_secs: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            max_body_bytes: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            host: "  ".to_string(),
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
