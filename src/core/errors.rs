//! Error types for the classification service.
//!
//! This module defines the errors that can occur while decoding uploads,
//! preprocessing images, loading the model, and running inference. It also
//! provides constructor helpers that attach the processing stage and context
//! to an underlying error.

use crate::core::config::ConfigError;
use thiserror::Error;

/// Enum representing different stages of image processing.
///
/// Used to identify which preprocessing step an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStage {
    /// Error occurred during image resizing.
    Resize,
    /// Error occurred during image normalization.
    Normalization,
    /// Error occurred during tensor operations.
    TensorOperation,
}

impl std::fmt::Display for ProcessingStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProcessingStage::Resize => write!(f, "resize"),
            ProcessingStage::Normalization => write!(f, "normalization"),
            ProcessingStage::TensorOperation => write!(f, "tensor operation"),
        }
    }
}

/// Errors raised by the classification service.
#[derive(Error, Debug)]
pub enum ServeError {
    /// Error occurred while decoding an image.
    #[error("image load")]
    ImageLoad(#[source] image::ImageError),

    /// Error occurred during processing.
    #[error("{kind} failed: {context}")]
    Processing {
        /// The stage of processing where the error occurred.
        kind: ProcessingStage,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error occurred while loading or running a model.
    #[error("{model_name} inference failed: {context}")]
    Inference {
        /// Name of the model that failed.
        model_name: String,
        /// Additional context about the error.
        context: String,
        /// The underlying error that caused this error.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Error indicating invalid input.
    #[error("invalid input: {message}")]
    InvalidInput {
        /// A message describing the invalid input.
        message: String,
    },

    /// Error indicating a configuration problem.
    #[error("configuration: {message}")]
    ConfigError {
        /// A message describing the configuration error.
        message: String,
    },

    /// Configuration validation failure.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ServeError {
    /// Creates a processing error for tensor operations.
    pub fn tensor_operation(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::TensorOperation, context, error)
    }

    /// Creates a processing error for normalization.
    pub fn normalization(
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::processing_error(ProcessingStage::Normalization, context, error)
    }

    /// Creates a processing error for the given stage.
    pub fn processing_error(
        kind: ProcessingStage,
        context: &str,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Processing {
            kind,
            context: context.to_string(),
            source: Box::new(error),
        }
    }

    /// Creates an inference error tagged with the model name.
    pub fn inference(
        model_name: &str,
        context: impl Into<String>,
        error: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Inference {
            model_name: model_name.to_string(),
            context: context.into(),
            source: Box::new(error),
        }
    }

    /// Creates an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Creates a configuration error.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }

    /// Renders the error followed by every source in its chain.
    ///
    /// The top-level messages are kept short, so clients that only see the
    /// rendered string need the sources to learn what actually went wrong.
    pub fn detailed_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(err) = source {
            let text = err.to_string();
            if !message.ends_with(&text) {
                message.push_str(": ");
                message.push_str(&text);
            }
            source = err.source();
        }
        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_processing_stage_display() {
        assert_eq!(ProcessingStage::Resize.to_string(), "resize");
        assert_eq!(ProcessingStage::TensorOperation.to_string(), "tensor operation");
    }

    #[test]
    fn test_detailed_message_includes_source_chain() {
        let io = std::io::Error::new(std::io::ErrorKind::InvalidData, "bad bytes");
        let err = ServeError::processing_error(ProcessingStage::Resize, "scaling upload", io);
        assert_eq!(
            err.detailed_message(),
            "resize failed: scaling upload: bad bytes"
        );
    }

    #[test]
    fn test_detailed_message_without_source() {
        let err = ServeError::invalid_input("uploaded file is empty");
        assert_eq!(err.detailed_message(), "invalid input: uploaded file is empty");
    }

    #[test]
    fn test_transparent_errors_are_not_repeated() {
        let err = ServeError::from(ConfigError::InvalidConfig {
            message: "port".to_string(),
        });
        assert_eq!(err.detailed_message(), "invalid configuration: port");
    }
}
