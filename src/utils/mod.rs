//! Utility functions for the classification service.
//!
//! This module provides image decoding helpers and conversions between
//! ndarray batches and Candle tensors.

pub mod image;
pub mod tensor;

pub use image::{decode_image, dynamic_to_rgb};
pub use tensor::tensor4d_to_device;
