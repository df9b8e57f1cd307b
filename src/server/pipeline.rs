//! Synchronous part of the upload pipeline.
//!
//! Decode, preprocess and inference are CPU (or accelerator) bound and run
//! back to back on a blocking thread. Each step advances the request's
//! [`PipelineState`], which is mirrored onto the request span.

use super::AppState;
use super::responses::{PredictionResponse, StageError};
use crate::core::{PipelineStage, PipelineState, ServeError};
use crate::utils::decode_image;
use candle_core::Tensor;
use image::RgbImage;
use tracing::{Span, debug};

/// Runs one upload through the pipeline, tracking its state.
pub struct UploadPipeline<'a> {
    app: &'a AppState,
    state: PipelineState,
    span: Span,
}

impl<'a> UploadPipeline<'a> {
    /// Starts a pipeline in the initial state, recording it on `span`.
    pub fn new(app: &'a AppState, span: Span) -> Self {
        let pipeline = Self {
            app,
            state: PipelineState::new(),
            span,
        };
        pipeline.record();
        pipeline
    }

    /// Current pipeline state.
    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// On failure `stage` keeps the label of the step that failed.
    fn record(&self) {
        self.span.record("state", self.state.as_u8());
        if let Some(stage) = self.state.pending_stage() {
            self.span.record("stage", stage.as_str());
        }
    }

    /// Advances the state on the step's outcome and tags failures with `stage`.
    fn step<T>(
        &mut self,
        stage: PipelineStage,
        result: Result<T, ServeError>,
    ) -> Result<T, StageError> {
        self.state = self.state.advance(result.is_ok());
        self.record();
        result.map_err(|source| StageError::new(stage, source))
    }

    /// Marks the request failed at the upload stage without running a step.
    ///
    /// Used when the multipart body could not be read at all.
    pub fn fail_upload(&mut self, source: ServeError) -> StageError {
        self.state = self.state.advance(false);
        self.record();
        StageError::new(PipelineStage::Upload, source)
    }

    /// Step 1: decode the upload into an RGB image.
    pub fn decode(&mut self, bytes: &[u8]) -> Result<RgbImage, StageError> {
        debug!(bytes = bytes.len(), "decoding upload");
        self.step(PipelineStage::Upload, decode_image(bytes))
    }

    /// Step 2: resize, normalize and move the batch to the model's device.
    pub fn preprocess(&mut self, image: &RgbImage) -> Result<Tensor, StageError> {
        let result = self
            .app
            .preprocessor
            .apply(image)
            .and_then(|batch| self.app.classifier.to_device(&batch));
        self.step(PipelineStage::Processing, result)
    }

    /// Step 3: run the model and take the arg-max of the first batch item.
    pub fn infer(&mut self, input: &Tensor) -> Result<usize, StageError> {
        let result = self.app.classifier.predict(input).and_then(|predictions| {
            predictions
                .first()
                .copied()
                .ok_or_else(|| ServeError::invalid_input("model returned no prediction"))
        });
        self.step(PipelineStage::Prediction, result)
    }

    /// Step 4: build the success body.
    ///
    /// The state is already `ResponsePending`; a failure here moves it to
    /// `Failed`.
    pub fn respond(&mut self, prediction: usize) -> Result<PredictionResponse, StageError> {
        let num_classes = self.app.classifier.num_classes();
        if prediction >= num_classes {
            let err = ServeError::invalid_input(format!(
                "predicted class {prediction} is outside 0..{num_classes}"
            ));
            return self.step(PipelineStage::Response, Err(err));
        }
        Ok(PredictionResponse::new(prediction))
    }

    /// Runs decode, preprocess, inference and response building in order.
    pub fn run(&mut self, bytes: &[u8]) -> Result<PredictionResponse, StageError> {
        let image = self.decode(bytes)?;
        let input = self.preprocess(&image)?;
        let prediction = self.infer(&input)?;
        debug!(prediction, "inference complete");
        self.respond(prediction)
    }
}
