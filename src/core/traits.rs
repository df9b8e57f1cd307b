//! Traits shared between the model layer and the HTTP layer.

use crate::core::{ServeError, Tensor4D};
use crate::utils::tensor::tensor4d_to_device;
use candle_core::{Device, Tensor};
use std::fmt::Debug;

/// An image classifier that maps a normalized NCHW batch to class indices.
///
/// Implementations are loaded once and shared read-only between requests,
/// so they must be `Send + Sync` and `predict` must not mutate state.
pub trait ImageClassifier: Send + Sync + Debug {
    /// Human readable model name used in logs and errors.
    fn model_name(&self) -> &str;

    /// Number of classes the model scores.
    fn num_classes(&self) -> usize;

    /// Device the model parameters live on.
    fn device(&self) -> &Device;

    /// Moves a preprocessed batch onto the model's device.
    fn to_device(&self, batch: &Tensor4D) -> Result<Tensor, ServeError> {
        tensor4d_to_device(batch, self.device())
    }

    /// Returns the arg-max class index for every image in the batch.
    fn predict(&self, input: &Tensor) -> Result<Vec<usize>, ServeError>;
}
