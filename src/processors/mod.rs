//! Image processing for classification inputs.
//!
//! - [`normalization`] - channel-wise normalization into CHW tensors
//! - [`preprocess`] - resize + normalize pipeline and its configuration

pub mod normalization;
pub mod preprocess;

pub use normalization::{IMAGENET_MEAN, IMAGENET_STD, NormalizeImage};
pub use preprocess::{ImagePreprocessor, PreprocessConfig, ResizeFilter};
