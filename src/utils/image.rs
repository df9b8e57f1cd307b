//! Utility functions for image decoding.
//!
//! Uploaded payloads arrive as raw bytes in any format the `image` crate can
//! sniff. They are decoded and flattened to 8-bit RGB, dropping any alpha
//! channel, before preprocessing.

use crate::core::ServeError;
use image::{DynamicImage, RgbImage};

/// Converts a DynamicImage to an RgbImage.
///
/// Alpha channels are discarded; grayscale images are replicated across the
/// three channels.
pub fn dynamic_to_rgb(img: DynamicImage) -> RgbImage {
    img.to_rgb8()
}

/// Decodes an in-memory image and converts it to an RgbImage.
///
/// # Errors
///
/// Returns `ServeError::InvalidInput` for an empty payload and
/// `ServeError::ImageLoad` when the format cannot be detected or the data is
/// corrupt.
pub fn decode_image(bytes: &[u8]) -> Result<RgbImage, ServeError> {
    if bytes.is_empty() {
        return Err(ServeError::invalid_input("uploaded file is empty"));
    }
    let img = image::load_from_memory(bytes).map_err(ServeError::ImageLoad)?;
    Ok(dynamic_to_rgb(img))
}
