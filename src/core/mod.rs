//! The core module of the classification service.
//!
//! This module contains the fundamental components shared by the rest of the
//! crate:
//! - Configuration management and validation
//! - Compute device selection
//! - Error handling
//! - Per-request pipeline state
//! - The classifier trait the HTTP layer depends on
//!
//! It also provides re-exports of commonly used types and functions.

pub mod config;
pub mod device;
pub mod errors;
pub mod state;
pub mod traits;

pub use config::{ConfigError, ConfigValidator, ServerConfig};
pub use device::{DeviceSpec, device_label};
pub use errors::{ProcessingStage, ServeError};
pub use state::{PipelineStage, PipelineState};
pub use traits::ImageClassifier;

/// Batched image tensor in NCHW layout.
pub type Tensor4D = ndarray::Array4<f32>;

/// Initializes the tracing subscriber for logging.
///
/// Sets up an environment filter and formatting layer. `RUST_LOG` takes
/// precedence; otherwise `default_directive` (for example `"info"`) is used.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
