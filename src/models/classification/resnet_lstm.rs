//! ResNet-50 + LSTM classification model.
//!
//! The backbone embeds each image into a 2048-d vector, which is fed to a
//! stacked LSTM as a sequence of length one. The final layer's last hidden
//! state goes through a linear head to produce class scores.

use super::resnet::{RESNET50_FEATURE_DIM, ResNet50Features};
use crate::core::config::{ConfigError, ConfigValidator};
use crate::core::{DeviceSpec, ImageClassifier, ServeError, device_label};
use candle_core::{D, DType, Device, Tensor};
use candle_nn::rnn::{LSTM, LSTMConfig, RNN};
use candle_nn::{Linear, Module, VarBuilder};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

const MODEL_NAME: &str = "ResNet50-LSTM";

/// Hyper-parameters of the classification model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResNetLstmConfig {
    /// Number of output classes.
    pub num_classes: usize,
    /// Hidden size of every LSTM layer.
    pub lstm_hidden: usize,
    /// Number of stacked LSTM layers.
    pub lstm_layers: usize,
}

impl Default for ResNetLstmConfig {
    fn default() -> Self {
        Self {
            num_classes: 31,
            lstm_hidden: 128,
            lstm_layers: 2,
        }
    }
}

impl ConfigValidator for ResNetLstmConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        self.validate_positive_usize(self.num_classes, "num_classes")?;
        self.validate_positive_usize(self.lstm_hidden, "lstm_hidden")?;
        self.validate_positive_usize(self.lstm_layers, "lstm_layers")?;
        Ok(())
    }
}

/// On-disk weight formats understood by the loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightFormat {
    /// `.safetensors`, memory-mapped.
    Safetensors,
    /// PyTorch state dict saved with `torch.save` (`.pth` / `.pt`).
    PyTorch,
}

impl WeightFormat {
    /// Picks the format from the file extension.
    pub fn from_path(path: &Path) -> Result<Self, ServeError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("safetensors") => Ok(WeightFormat::Safetensors),
            Some("pth") | Some("pt") | Some("bin") => Ok(WeightFormat::PyTorch),
            _ => Err(ServeError::config_error(format!(
                "unsupported weights file '{}': expected .safetensors, .pth or .pt",
                path.display()
            ))),
        }
    }
}

/// ResNet-50 feature extractor, stacked LSTM and linear head.
#[derive(Debug)]
pub struct ResNetLstm {
    features: ResNet50Features,
    lstm: Vec<LSTM>,
    fc: Linear,
    config: ResNetLstmConfig,
    device: Device,
}

impl ResNetLstm {
    /// Builds the model from a var builder rooted at the state dict.
    ///
    /// Expects `resnet.*`, `lstm.*_l{N}` and `fc.*` parameters.
    pub fn load(config: &ResNetLstmConfig, vb: VarBuilder) -> Result<Self, ServeError> {
        config.validate()?;
        let device = vb.device().clone();

        let features = ResNet50Features::load(vb.pp("resnet"))
            .map_err(|e| ServeError::inference(MODEL_NAME, "load resnet feature extractor", e))?;

        let lstm = (0..config.lstm_layers)
            .map(|layer_idx| {
                let in_dim = if layer_idx == 0 {
                    RESNET50_FEATURE_DIM
                } else {
                    config.lstm_hidden
                };
                let lstm_config = LSTMConfig {
                    layer_idx,
                    ..Default::default()
                };
                candle_nn::lstm(in_dim, config.lstm_hidden, lstm_config, vb.pp("lstm")).map_err(
                    |e| ServeError::inference(MODEL_NAME, format!("load lstm layer {layer_idx}"), e),
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let fc = candle_nn::linear(config.lstm_hidden, config.num_classes, vb.pp("fc"))
            .map_err(|e| ServeError::inference(MODEL_NAME, "load fc head", e))?;

        Ok(Self {
            features,
            lstm,
            fc,
            config: config.clone(),
            device,
        })
    }

    /// Model hyper-parameters.
    pub fn config(&self) -> &ResNetLstmConfig {
        &self.config
    }

    /// Maps a `(batch, 3, H, W)` batch to `(batch, num_classes)` scores.
    pub fn forward(&self, xs: &Tensor) -> Result<Tensor, ServeError> {
        self.forward_scores(xs).map_err(|e| {
            ServeError::inference(
                MODEL_NAME,
                format!("forward pass on input with shape {:?}", xs.dims()),
                e,
            )
        })
    }

    fn forward_scores(&self, xs: &Tensor) -> candle_core::Result<Tensor> {
        let features = self.features.forward(xs)?;
        // (batch, 2048) -> (batch, seq_len = 1, 2048)
        let mut sequence = features.unsqueeze(1)?;
        let mut last_hidden = None;
        for layer in &self.lstm {
            let states = layer.seq(&sequence)?;
            sequence = layer.states_to_tensor(&states)?;
            last_hidden = states.last().map(|state| state.h().clone());
        }
        let last_hidden = last_hidden
            .ok_or_else(|| candle_core::Error::Msg("sequence encoder has no layers".into()))?;
        self.fc.forward(&last_hidden)
    }
}

impl ImageClassifier for ResNetLstm {
    fn model_name(&self) -> &str {
        MODEL_NAME
    }

    fn num_classes(&self) -> usize {
        self.config.num_classes
    }

    fn device(&self) -> &Device {
        &self.device
    }

    fn predict(&self, input: &Tensor) -> Result<Vec<usize>, ServeError> {
        let scores = self.forward(input)?;
        let predictions = scores
            .argmax(D::Minus1)
            .and_then(|indices| indices.to_vec1::<u32>())
            .map_err(|e| ServeError::inference(MODEL_NAME, "arg-max over class scores", e))?;
        Ok(predictions.into_iter().map(|p| p as usize).collect())
    }
}

/// Builder that loads a [`ResNetLstm`] from a weights file.
#[derive(Debug, Default)]
pub struct ResNetLstmBuilder {
    config: ResNetLstmConfig,
    device: DeviceSpec,
}

impl ResNetLstmBuilder {
    /// Creates a builder with the default 31-class configuration on the auto device.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model hyper-parameters.
    pub fn config(mut self, config: ResNetLstmConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the compute device.
    pub fn device(mut self, device: DeviceSpec) -> Self {
        self.device = device;
        self
    }

    /// Loads the weights and returns a model ready for inference.
    ///
    /// # Errors
    ///
    /// Fails if the file is missing, has an unsupported extension, cannot be
    /// read, or lacks a parameter (or has one with the wrong shape).
    pub fn build(self, weights_path: impl AsRef<Path>) -> Result<ResNetLstm, ServeError> {
        let weights_path = weights_path.as_ref();
        self.config.validate()?;
        self.config.validate_model_path(weights_path)?;
        let format = WeightFormat::from_path(weights_path)?;
        let device = self.device.resolve()?;

        debug!(
            path = %weights_path.display(),
            ?format,
            device = device_label(&device),
            "loading model weights"
        );

        let vb = match format {
            WeightFormat::Safetensors => unsafe {
                VarBuilder::from_mmaped_safetensors(&[weights_path], DType::F32, &device)
            },
            WeightFormat::PyTorch => VarBuilder::from_pth(weights_path, DType::F32, &device),
        }
        .map_err(|e| {
            ServeError::inference(
                MODEL_NAME,
                format!("read weights from {}", weights_path.display()),
                e,
            )
        })?;

        let model = ResNetLstm::load(&self.config, vb)?;
        info!(
            model = MODEL_NAME,
            num_classes = self.config.num_classes,
            device = device_label(&device),
            "model loaded"
        );
        Ok(model)
    }
}
