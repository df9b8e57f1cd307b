//! Compute device selection for Candle models.
//!
//! A [`DeviceSpec`] is parsed from strings such as `"auto"`, `"cpu"`, `"cuda"`
//! or `"cuda:1"` and resolved to a Candle [`Device`] when the model is loaded.

use crate::core::ServeError;
use candle_core::Device;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DeviceSpec {
    /// CUDA device 0 when available, otherwise the CPU.
    #[default]
    Auto,
    /// Always run on the CPU.
    Cpu,
    /// Run on the CUDA device with the given ordinal.
    Cuda(usize),
}

#[cfg(not(feature = "cuda"))]
fn cuda_not_enabled() -> ServeError {
    ServeError::config_error("CUDA support not enabled. Compile with --features cuda")
}

impl DeviceSpec {
    /// Resolves the spec to a concrete Candle device.
    ///
    /// # Errors
    ///
    /// Returns an error if CUDA is requested explicitly and either the `cuda`
    /// feature is disabled or the device cannot be created.
    pub fn resolve(&self) -> Result<Device, ServeError> {
        match self {
            DeviceSpec::Auto => Device::cuda_if_available(0).map_err(|e| {
                ServeError::config_error(format!("failed to select compute device: {e}"))
            }),
            DeviceSpec::Cpu => Ok(Device::Cpu),
            DeviceSpec::Cuda(ordinal) => {
                #[cfg(feature = "cuda")]
                {
                    Device::new_cuda(*ordinal).map_err(|e| {
                        ServeError::config_error(format!(
                            "Failed to create CUDA device {}: {}",
                            ordinal, e
                        ))
                    })
                }
                #[cfg(not(feature = "cuda"))]
                {
                    let _ = ordinal;
                    Err(cuda_not_enabled())
                }
            }
        }
    }
}

/// Short label for a resolved device, used in logs and the health endpoint.
pub fn device_label(device: &Device) -> &'static str {
    match device {
        Device::Cpu => "cpu",
        Device::Cuda(_) => "cuda",
        Device::Metal(_) => "metal",
    }
}

impl FromStr for DeviceSpec {
    type Err = ServeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "auto" => Ok(DeviceSpec::Auto),
            "cpu" => Ok(DeviceSpec::Cpu),
            "cuda" | "gpu" => Ok(DeviceSpec::Cuda(0)),
            other => match other.strip_prefix("cuda:") {
                Some(ordinal) => ordinal.parse().map(DeviceSpec::Cuda).map_err(|_| {
                    ServeError::config_error(format!("Invalid CUDA device ordinal in '{}'", s))
                }),
                None => Err(ServeError::config_error(format!(
                    "Unknown device: '{}'. Use 'auto', 'cpu', 'cuda', or 'cuda:N'",
                    s
                ))),
            },
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSpec::Auto => write!(f, "auto"),
            DeviceSpec::Cpu => write!(f, "cpu"),
            DeviceSpec::Cuda(ordinal) => write!(f, "cuda:{}", ordinal),
        }
    }
}

impl TryFrom<String> for DeviceSpec {
    type Error = ServeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DeviceSpec> for String {
    fn from(spec: DeviceSpec) -> Self {
        spec.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_device_spec() {
        assert_eq!("auto".parse::<DeviceSpec>().unwrap(), DeviceSpec::Auto);
        assert_eq!("CPU".parse::<DeviceSpec>().unwrap(), DeviceSpec::Cpu);
        assert_eq!("gpu".parse::<DeviceSpec>().unwrap(), DeviceSpec::Cuda(0));
        assert_eq!("cuda:2".parse::<DeviceSpec>().unwrap(), DeviceSpec::Cuda(2));
    }

    #[test]
    fn test_parse_device_spec_errors() {
        assert!("cuda:x".parse::<DeviceSpec>().is_err());
        assert!("tpu".parse::<DeviceSpec>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_serde() {
        let json = serde_json::to_string(&DeviceSpec::Cuda(1)).unwrap();
        assert_eq!(json, "\"cuda:1\"");
        let spec: DeviceSpec = serde_json::from_str(&json).unwrap();
        assert_eq!(spec, DeviceSpec::Cuda(1));
        assert!(serde_json::from_str::<DeviceSpec>("\"npu\"").is_err());
    }

    #[test]
    fn test_resolve_cpu() {
        let device = DeviceSpec::Cpu.resolve().unwrap();
        assert_eq!(device_label(&device), "cpu");
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_resolve_auto_falls_back_to_cpu() {
        let device = DeviceSpec::Auto.resolve().unwrap();
        assert!(device.is_cpu());
    }

    #[cfg(not(feature = "cuda"))]
    #[test]
    fn test_resolve_cuda_without_feature() {
        assert!(DeviceSpec::Cuda(0).resolve().is_err());
    }
}
