//! Per-request pipeline state.
//!
//! An upload moves through decode, preprocess, inference and response
//! emission in strict order. [`PipelineState`] records which step's result is
//! pending; any failure jumps to [`PipelineState::Failed`], which absorbs all
//! further transitions. The handler only records the state on its tracing
//! span and never branches on it.

use std::fmt;

/// A stage of the upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Reading the upload and decoding it into an RGB image.
    Upload,
    /// Resizing, normalizing and moving the tensor to the device.
    Processing,
    /// Running the model and taking the arg-max.
    Prediction,
    /// Emitting the success response.
    Response,
}

impl PipelineStage {
    /// Client-facing message reported when this stage fails.
    pub fn failure_message(&self) -> &'static str {
        match self {
            PipelineStage::Upload => "image upload problem",
            PipelineStage::Processing => "image processing problem",
            PipelineStage::Prediction => "prediction problem",
            PipelineStage::Response => "response problem",
        }
    }

    /// Short label used on tracing spans.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineStage::Upload => "upload",
            PipelineStage::Processing => "processing",
            PipelineStage::Prediction => "prediction",
            PipelineStage::Response => "response",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a single request in the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Waiting for the upload to be decoded.
    #[default]
    DecodePending = 1,
    /// Waiting for preprocessing.
    PreprocessPending = 2,
    /// Waiting for inference.
    InferencePending = 3,
    /// Waiting for the response to be emitted. Terminal on success.
    ResponsePending = 4,
    /// A step failed. Terminal and absorbing.
    Failed = 5,
}

impl PipelineState {
    /// Initial state of every request.
    pub fn new() -> Self {
        Self::DecodePending
    }

    /// Returns the state reached after the current step finished.
    ///
    /// A valid step moves one position along the chain and stays put once
    /// `ResponsePending` is reached. An invalid step always yields `Failed`.
    pub fn advance(self, valid: bool) -> Self {
        if !valid {
            return PipelineState::Failed;
        }
        match self {
            PipelineState::DecodePending => PipelineState::PreprocessPending,
            PipelineState::PreprocessPending => PipelineState::InferencePending,
            PipelineState::InferencePending => PipelineState::ResponsePending,
            PipelineState::ResponsePending => PipelineState::ResponsePending,
            PipelineState::Failed => PipelineState::Failed,
        }
    }

    /// Numeric code in `1..=5`.
    pub fn as_u8(&self) -> u8 {
        *self as u8
    }

    /// The stage whose result this state is waiting for, if any.
    pub fn pending_stage(&self) -> Option<PipelineStage> {
        match self {
            PipelineState::DecodePending => Some(PipelineStage::Upload),
            PipelineState::PreprocessPending => Some(PipelineStage::Processing),
            PipelineState::InferencePending => Some(PipelineStage::Prediction),
            PipelineState::ResponsePending => Some(PipelineStage::Response),
            PipelineState::Failed => None,
        }
    }

    /// Short label used on tracing spans.
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineState::DecodePending => "decode_pending",
            PipelineState::PreprocessPending => "preprocess_pending",
            PipelineState::InferencePending => "inference_pending",
            PipelineState::ResponsePending => "response_pending",
            PipelineState::Failed => "error",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.as_u8(), self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state() {
        let state = PipelineState::new();
        assert_eq!(state.as_u8(), 1);
        assert_eq!(state, PipelineState::default());
    }

    #[test]
    fn test_valid_chain() {
        let state = PipelineState::new().advance(true);
        assert_eq!(state.as_u8(), 2);
        let state = state.advance(true);
        assert_eq!(state.as_u8(), 3);
        let state = state.advance(true);
        assert_eq!(state, PipelineState::ResponsePending);
        // No valid transition is defined out of the success state.
        assert_eq!(state.advance(true), PipelineState::ResponsePending);
    }

    #[test]
    fn test_failure_from_every_state() {
        for state in [
            PipelineState::DecodePending,
            PipelineState::PreprocessPending,
            PipelineState::InferencePending,
            PipelineState::ResponsePending,
            PipelineState::Failed,
        ] {
            assert_eq!(state.advance(false), PipelineState::Failed);
        }
    }

    #[test]
    fn test_failed_is_absorbing() {
        let state = PipelineState::new().advance(false);
        assert_eq!(state.as_u8(), 5);
        assert_eq!(state.advance(true), PipelineState::Failed);
        assert_eq!(state.pending_stage(), None);
    }

    #[test]
    fn test_pending_stage_messages() {
        assert_eq!(
            PipelineState::DecodePending
                .pending_stage()
                .map(|s| s.failure_message()),
            Some("image upload problem")
        );
        assert_eq!(
            PipelineState::PreprocessPending
                .pending_stage()
                .map(|s| s.failure_message()),
            Some("image processing problem")
        );
        assert_eq!(
            PipelineState::InferencePending
                .pending_stage()
                .map(|s| s.failure_message()),
            Some("prediction problem")
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(PipelineState::Failed.to_string(), "5 (error)");
        assert_eq!(PipelineStage::Processing.to_string(), "processing");
    }
}
