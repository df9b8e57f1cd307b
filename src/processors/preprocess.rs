//! Classification preprocessing.
//!
//! Uploads of any size are resized to the model's fixed input shape, scaled
//! to `[0, 1]` and normalized per channel, yielding a `(1, 3, H, W)` batch.

use super::normalization::{IMAGENET_MEAN, IMAGENET_STD, NormalizeImage};
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::{ProcessingStage, ServeError, Tensor4D};
use image::{RgbImage, imageops::FilterType};
use serde::{Deserialize, Serialize};

/// Resampling filter used when resizing uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResizeFilter {
    Nearest,
    /// Linear interpolation, the torchvision `Resize` default.
    #[default]
    Bilinear,
    Bicubic,
    Lanczos3,
}

impl From<ResizeFilter> for FilterType {
    fn from(filter: ResizeFilter) -> Self {
        match filter {
            ResizeFilter::Nearest => FilterType::Nearest,
            ResizeFilter::Bilinear => FilterType::Triangle,
            ResizeFilter::Bicubic => FilterType::CatmullRom,
            ResizeFilter::Lanczos3 => FilterType::Lanczos3,
        }
    }
}

/// Configuration for image preprocessing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    /// Input shape (height, width)
    pub input_shape: (u32, u32),
    /// Resizing filter to use
    pub resize_filter: ResizeFilter,
    /// Scaling factor applied before normalization (defaults to 1.0 / 255.0)
    pub normalize_scale: f32,
    /// Mean values for normalization (RGB order)
    pub normalize_mean: Vec<f32>,
    /// Standard deviation values for normalization (RGB order)
    pub normalize_std: Vec<f32>,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        Self {
            input_shape: (224, 224),
            resize_filter: ResizeFilter::default(),
            normalize_scale: 1.0 / 255.0,
            normalize_mean: IMAGENET_MEAN.to_vec(),
            normalize_std: IMAGENET_STD.to_vec(),
        }
    }
}

impl ConfigValidator for PreprocessConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let (height, width) = self.input_shape;
        self.validate_image_dimensions(width, height)?;
        self.validate_positive_f32(self.normalize_scale, "normalize_scale")?;

        if self.normalize_mean.len() != 3 || self.normalize_std.len() != 3 {
            return Err(ConfigError::InvalidConfig {
                message: "normalize_mean and normalize_std must have exactly 3 elements"
                    .to_string(),
            });
        }
        for &s in &self.normalize_std {
            self.validate_positive_f32(s, "normalize_std")?;
        }
        Ok(())
    }
}

/// Resizes and normalizes decoded uploads.
#[derive(Debug, Clone)]
pub struct ImagePreprocessor {
    /// Image normalizer for preprocessing
    normalizer: NormalizeImage,
    /// Input shape (height, width)
    input_shape: (u32, u32),
    /// Resizing filter
    resize_filter: FilterType,
}

impl ImagePreprocessor {
    /// Builds a preprocessor from its configuration.
    pub fn new(config: &PreprocessConfig) -> Result<Self, ServeError> {
        config.validate()?;
        let normalizer = NormalizeImage::new(
            Some(config.normalize_scale),
            Some(config.normalize_mean.clone()),
            Some(config.normalize_std.clone()),
        )?;
        Ok(Self {
            normalizer,
            input_shape: config.input_shape,
            resize_filter: config.resize_filter.into(),
        })
    }

    /// Input shape (height, width) produced by [`ImagePreprocessor::apply`].
    pub fn input_shape(&self) -> (u32, u32) {
        self.input_shape
    }

    /// Resizes an image to the input shape, ignoring its aspect ratio.
    pub fn resize(&self, image: &RgbImage) -> Result<RgbImage, ServeError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(ServeError::processing_error(
                ProcessingStage::Resize,
                "cannot resize image",
                std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    format!("image has zero size ({}x{})", width, height),
                ),
            ));
        }

        let (target_h, target_w) = self.input_shape;
        if (width, height) == (target_w, target_h) {
            return Ok(image.clone());
        }
        Ok(image::imageops::resize(
            image,
            target_w,
            target_h,
            self.resize_filter,
        ))
    }

    /// Resizes and normalizes one image into a `(1, 3, H, W)` batch.
    pub fn apply(&self, image: &RgbImage) -> Result<Tensor4D, ServeError> {
        let resized = self.resize(image)?;
        self.normalizer.normalize_to(&resized)
    }
}
