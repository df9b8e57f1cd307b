//! Image classification models.
//!
//! - [`resnet`] - ResNet-50 feature extractor
//! - [`resnet_lstm`] - feature extractor + LSTM + linear head, and its loader

pub mod resnet;
pub mod resnet_lstm;

pub use resnet::{RESNET50_FEATURE_DIM, ResNet50Features};
pub use resnet_lstm::{ResNetLstm, ResNetLstmBuilder, ResNetLstmConfig, WeightFormat};
