//! Conversions between ndarray batches and Candle tensors.

use crate::core::{ServeError, Tensor4D};
use candle_core::{Device, Tensor};

/// Copies an NCHW ndarray batch into a Candle tensor on `device`.
///
/// Elements are read in logical order, so non-standard layouts (for example
/// a transposed view) are handled correctly.
pub fn tensor4d_to_device(batch: &Tensor4D, device: &Device) -> Result<Tensor, ServeError> {
    let shape = batch.shape().to_vec();
    let data: Vec<f32> = batch.iter().copied().collect();
    Tensor::from_vec(data, shape, device).map_err(|e| {
        ServeError::tensor_operation(
            &format!("failed to move batch with shape {:?} to device", batch.shape()),
            e,
        )
    })
}
