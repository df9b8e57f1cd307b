//! # OAR CLS Serve
//!
//! An HTTP image classification service. Clients upload one image to
//! `POST /upload/` and get back the index of the most likely of 31 classes,
//! as scored by a ResNet-50 feature extractor followed by a two layer LSTM
//! and a linear head running on [Candle](https://github.com/huggingface/candle).
//!
//! ## Pipeline
//!
//! Every upload passes through four steps, each tracked by a
//! [`PipelineState`](core::PipelineState):
//!
//! 1. **Upload**: read the multipart `file` field and decode it as RGB
//! 2. **Processing**: resize to 224x224, scale to `[0, 1]`, normalize with the
//!    ImageNet mean and standard deviation
//! 3. **Prediction**: run the model and take the arg-max
//! 4. **Response**: `{"prediction": <int>, "message": "prediction successful"}`
//!
//! A failure in any step yields `500` with
//! `{"error": <detail>, "message": <stage message>}`.
//!
//! ## Modules
//!
//! * [`core`] - Configuration, devices, errors, pipeline state and the classifier trait
//! * [`models`] - The ResNet-50 + LSTM classifier and its weight loader
//! * [`processors`] - Resizing and normalization
//! * [`server`] - Axum router, handlers and response bodies
//! * [`utils`] - Image decoding and tensor conversion helpers
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use oar_cls_serve::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServerConfig::default();
//! let model = ResNetLstmBuilder::new()
//!     .config(config.model.clone())
//!     .device(config.device)
//!     .build(&config.weights_path)?;
//!
//! startup(config, Arc::new(model)).await?;
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod models;
pub mod processors;
pub mod server;
pub mod utils;

/// Commonly used types for embedding the service.
pub mod prelude {
    pub use crate::core::{
        ConfigValidator, DeviceSpec, ImageClassifier, PipelineStage, PipelineState, ServeError,
        ServerConfig, init_tracing,
    };
    pub use crate::models::classification::{ResNetLstm, ResNetLstmBuilder, ResNetLstmConfig};
    pub use crate::processors::{ImagePreprocessor, PreprocessConfig};
    pub use crate::server::{AppState, build_app, startup};
}
