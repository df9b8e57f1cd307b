//! Image normalization utilities.
//!
//! This module provides channel-wise normalization with a scale factor, mean
//! and standard deviation, producing CHW float tensors ready for inference.

use crate::core::{ServeError, Tensor4D};
use image::RgbImage;

/// ImageNet channel means in RGB order.
pub const IMAGENET_MEAN: [f32; 3] = [0.485, 0.456, 0.406];
/// ImageNet channel standard deviations in RGB order.
pub const IMAGENET_STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Normalizes images for inference.
///
/// Each channel value `v` is mapped to `(v * scale - mean) / std`, which is
/// stored as `v * alpha + beta` with `alpha = scale / std` and
/// `beta = -mean / std`.
#[derive(Debug, Clone)]
pub struct NormalizeImage {
    /// Scaling factors for each channel (alpha = scale / std)
    pub alpha: Vec<f32>,
    /// Offset values for each channel (beta = -mean / std)
    pub beta: Vec<f32>,
}

impl NormalizeImage {
    /// Creates a new NormalizeImage instance with the specified parameters.
    ///
    /// # Arguments
    ///
    /// * `scale` - Optional scaling factor (defaults to 1.0/255.0)
    /// * `mean` - Optional mean values for each channel (defaults to [0.485, 0.456, 0.406])
    /// * `std` - Optional standard deviation values for each channel (defaults to [0.229, 0.224, 0.225])
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// * Scale is less than or equal to 0
    /// * Mean or std vectors don't have exactly 3 elements
    /// * Any standard deviation value is less than or equal to 0
    pub fn new(
        scale: Option<f32>,
        mean: Option<Vec<f32>>,
        std: Option<Vec<f32>>,
    ) -> Result<Self, ServeError> {
        let scale = scale.unwrap_or(1.0 / 255.0);
        let mean = mean.unwrap_or_else(|| IMAGENET_MEAN.to_vec());
        let std = std.unwrap_or_else(|| IMAGENET_STD.to_vec());

        if !(scale > 0.0) {
            return Err(ServeError::config_error("Scale must be greater than 0"));
        }

        if mean.len() != 3 {
            return Err(ServeError::config_error(
                "Mean must have exactly 3 elements for RGB",
            ));
        }

        if std.len() != 3 {
            return Err(ServeError::config_error(
                "Std must have exactly 3 elements for RGB",
            ));
        }

        for (i, &s) in std.iter().enumerate() {
            if !(s > 0.0) {
                return Err(ServeError::config_error(format!(
                    "Standard deviation at index {i} must be greater than 0, got {s}"
                )));
            }
        }

        let alpha: Vec<f32> = std.iter().map(|s| scale / s).collect();
        let beta: Vec<f32> = mean.iter().zip(&std).map(|(m, s)| -m / s).collect();

        let normalizer = Self { alpha, beta };
        normalizer.validate_config()?;
        Ok(normalizer)
    }

    /// Creates the ImageNet normalizer used by torchvision-trained backbones.
    pub fn imagenet() -> Result<Self, ServeError> {
        Self::new(None, None, None)
    }

    /// Validates that alpha and beta hold three finite values each.
    pub fn validate_config(&self) -> Result<(), ServeError> {
        if self.alpha.len() != 3 || self.beta.len() != 3 {
            return Err(ServeError::config_error(
                "Alpha and beta must have exactly 3 elements for RGB",
            ));
        }

        for (i, &alpha) in self.alpha.iter().enumerate() {
            if !alpha.is_finite() {
                return Err(ServeError::config_error(format!(
                    "Alpha value at index {i} is not finite: {alpha}"
                )));
            }
        }

        for (i, &beta) in self.beta.iter().enumerate() {
            if !beta.is_finite() {
                return Err(ServeError::config_error(format!(
                    "Beta value at index {i} is not finite: {beta}"
                )));
            }
        }

        Ok(())
    }

    /// Normalizes a single image and returns it as a `(1, 3, H, W)` tensor.
    pub fn normalize_to(&self, img: &RgbImage) -> Result<Tensor4D, ServeError> {
        let (width, height) = img.dimensions();
        let (w, h) = (width as usize, height as usize);
        let plane = h * w;
        let mut result = vec![0.0f32; 3 * plane];

        for (x, y, pixel) in img.enumerate_pixels() {
            let offset = y as usize * w + x as usize;
            for c in 0..3 {
                result[c * plane + offset] = pixel[c] as f32 * self.alpha[c] + self.beta[c];
            }
        }

        ndarray::Array4::from_shape_vec((1, 3, h, w), result).map_err(|e| {
            ServeError::normalization(
                &format!("failed to create CHW tensor for {}x{} image", width, height),
                e,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn assert_close(actual: f32, expected: f32) {
        assert!(
            (actual - expected).abs() < 1e-5,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_imagenet_formula() {
        let normalizer = NormalizeImage::imagenet().unwrap();
        let img = RgbImage::from_pixel(2, 1, Rgb([255, 128, 0]));
        let tensor = normalizer.normalize_to(&img).unwrap();

        assert_eq!(tensor.shape(), &[1, 3, 1, 2]);
        for x in 0..2 {
            assert_close(tensor[[0, 0, 0, x]], (1.0 - 0.485) / 0.229);
            assert_close(tensor[[0, 1, 0, x]], (128.0 / 255.0 - 0.456) / 0.224);
            assert_close(tensor[[0, 2, 0, x]], (0.0 - 0.406) / 0.225);
        }
    }

    #[test]
    fn test_chw_layout_follows_pixel_positions() {
        let normalizer =
            NormalizeImage::new(Some(1.0), Some(vec![0.0; 3]), Some(vec![1.0; 3])).unwrap();
        let mut img = RgbImage::new(3, 2);
        img.put_pixel(2, 1, Rgb([7, 8, 9]));
        let tensor = normalizer.normalize_to(&img).unwrap();

        assert_eq!(tensor[[0, 0, 1, 2]], 7.0);
        assert_eq!(tensor[[0, 1, 1, 2]], 8.0);
        assert_eq!(tensor[[0, 2, 1, 2]], 9.0);
        assert_eq!(tensor[[0, 0, 0, 0]], 0.0);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(NormalizeImage::new(Some(0.0), None, None).is_err());
        assert!(NormalizeImage::new(None, Some(vec![0.5, 0.5]), None).is_err());
        assert!(NormalizeImage::new(None, None, Some(vec![0.2, 0.0, 0.2])).is_err());
        assert!(NormalizeImage::new(None, None, Some(vec![0.2, f32::NAN, 0.2])).is_err());
    }

    #[test]
    fn test_alpha_beta() {
        let normalizer = NormalizeImage::imagenet().unwrap();
        assert_close(normalizer.alpha[0], 1.0 / 255.0 / 0.229);
        assert_close(normalizer.beta[2], -0.406 / 0.225);
    }
}
