//! Axum handlers for the upload and health routes.
//!
//! The multipart body is read on the async runtime; everything after that
//! runs in [`UploadPipeline`] on the blocking pool.

use super::AppState;
use super::pipeline::UploadPipeline;
use super::responses::{HealthResponse, PredictionResponse, StageError};
use crate::core::{PipelineStage, PipelineState, ServeError, device_label};
use axum::{
    Json,
    body::Bytes,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
};
use std::sync::Arc;
use tracing::{Instrument, Span, field, info, info_span, warn};

/// Name of the multipart field that carries the image.
pub const UPLOAD_FIELD: &str = "file";

fn multipart_error(err: MultipartError) -> ServeError {
    ServeError::invalid_input(format!("failed to read multipart body: {}", err.body_text()))
}

/// Pulls the bytes of the `file` field out of the multipart body.
///
/// Other fields are skipped. A missing field is an error; an empty one is
/// not, and is rejected later by the decoder.
async fn read_upload(mut multipart: Multipart) -> Result<Bytes, ServeError> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(UPLOAD_FIELD) {
            return field.bytes().await.map_err(multipart_error);
        }
    }
    Err(ServeError::invalid_input(format!(
        "multipart body has no `{UPLOAD_FIELD}` field"
    )))
}

/// `POST /upload/`: classify one uploaded image.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictionResponse>, StageError> {
    let span = info_span!(
        "upload",
        state = field::Empty,
        stage = field::Empty,
        prediction = field::Empty
    );

    let result = async {
        let bytes = match multipart {
            Ok(multipart) => read_upload(multipart).await,
            Err(rejection) => Err(ServeError::invalid_input(rejection.body_text())),
        };
        let bytes = match bytes {
            Ok(bytes) => bytes,
            Err(err) => return Err(UploadPipeline::new(&state, Span::current()).fail_upload(err)),
        };

        let task_state = Arc::clone(&state);
        let task_span = Span::current();
        tokio::task::spawn_blocking(move || {
            let span = task_span.clone();
            span.in_scope(|| UploadPipeline::new(&task_state, task_span).run(&bytes))
        })
        .await
        .map_err(|err| {
            Span::current().record("state", PipelineState::Failed.as_u8());
            StageError::new(
                PipelineStage::Prediction,
                ServeError::inference(state.classifier.model_name(), "blocking inference task", err),
            )
        })?
    }
    .instrument(span.clone())
    .await;

    match &result {
        Ok(response) => {
            span.record("prediction", response.prediction);
            info!(parent: &span, prediction = response.prediction, "prediction successful");
        }
        Err(err) => {
            warn!(parent: &span, stage = err.stage.as_str(), error = %err, "upload failed");
        }
    }
    result.map(Json)
}

/// `GET /health`: report the loaded model.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        model: state.classifier.model_name().to_string(),
        device: device_label(state.classifier.device()).to_string(),
        num_classes: state.classifier.num_classes(),
    })
}
