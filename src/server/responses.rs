//! JSON bodies returned by the upload endpoint.

use crate::core::{PipelineStage, ServeError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Message sent with every successful prediction.
pub const PREDICTION_SUCCESSFUL: &str = "prediction successful";

/// Body of a successful prediction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredictionResponse {
    /// Arg-max class index.
    pub prediction: usize,
    pub message: String,
}

impl PredictionResponse {
    pub fn new(prediction: usize) -> Self {
        Self {
            prediction,
            message: PREDICTION_SUCCESSFUL.to_string(),
        }
    }
}

/// Body of a failed request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Underlying error text.
    pub error: String,
    /// Stage-specific, human readable summary.
    pub message: String,
}

/// Body of the health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub model: String,
    pub device: String,
    pub num_classes: usize,
}

/// A pipeline failure tagged with the stage it happened in.
///
/// Every stage failure is reported as `500 Internal Server Error`.
#[derive(Debug, thiserror::Error)]
#[error("{} stage failed: {}", .stage, .source.detailed_message())]
pub struct StageError {
    pub stage: PipelineStage,
    #[source]
    pub source: ServeError,
}

impl StageError {
    pub fn new(stage: PipelineStage, source: ServeError) -> Self {
        Self { stage, source }
    }

    /// The JSON body sent to the client.
    pub fn body(&self) -> ErrorResponse {
        ErrorResponse {
            error: self.source.detailed_message(),
            message: self.stage.failure_message().to_string(),
        }
    }
}

impl IntoResponse for StageError {
    fn into_response(self) -> Response {
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_response_json() {
        let json = serde_json::to_value(PredictionResponse::new(7)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"prediction": 7, "message": "prediction successful"})
        );
    }

    #[test]
    fn test_stage_error_body() {
        let err = StageError::new(
            PipelineStage::Upload,
            ServeError::invalid_input("uploaded file is empty"),
        );
        assert_eq!(
            err.body(),
            ErrorResponse {
                error: "invalid input: uploaded file is empty".to_string(),
                message: "image upload problem".to_string(),
            }
        );
    }

    #[test]
    fn test_stage_error_status() {
        let err = StageError::new(
            PipelineStage::Prediction,
            ServeError::config_error("boom"),
        );
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
