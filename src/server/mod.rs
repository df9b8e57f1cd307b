//! HTTP surface of the classification service.
//!
//! - [`handlers`] - `POST /upload/` and `GET /health`
//! - [`pipeline`] - the per-request decode / preprocess / infer / respond chain
//! - [`responses`] - JSON bodies and the stage-tagged error type

pub mod handlers;
pub mod pipeline;
pub mod responses;

pub use pipeline::UploadPipeline;
pub use responses::{ErrorResponse, HealthResponse, PredictionResponse, StageError};

use crate::core::{ImageClassifier, ServeError, ServerConfig, device_label};
use crate::processors::ImagePreprocessor;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::{error, info};

/// Shared, read-only state handed to every request.
#[derive(Debug)]
pub struct AppState {
    pub classifier: Arc<dyn ImageClassifier>,
    pub preprocessor: ImagePreprocessor,
}

impl AppState {
    /// Builds the state from a loaded classifier and the configured preprocessing.
    pub fn new(
        classifier: Arc<dyn ImageClassifier>,
        config: &ServerConfig,
    ) -> Result<Self, ServeError> {
        Ok(Self {
            classifier,
            preprocessor: ImagePreprocessor::new(&config.preprocess)?,
        })
    }
}

/// Builds the router with its body limit, timeout and tracing layers.
pub fn build_app(state: Arc<AppState>, config: &ServerConfig) -> Router {
    Router::new()
        .route("/upload/", post(handlers::upload))
        .route("/upload", post(handlers::upload))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout(),
        ))
        .layer(DefaultBodyLimit::max(config.max_body_bytes))
        .with_state(state)
}

/// Binds the configured address and serves until Ctrl+C or SIGTERM.
pub async fn startup(
    config: ServerConfig,
    classifier: Arc<dyn ImageClassifier>,
) -> Result<(), Box<dyn std::error::Error>> {
    let state = Arc::new(AppState::new(classifier, &config)?);
    let app = build_app(Arc::clone(&state), &config);

    let addr = config.bind_addr();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("failed to bind {addr}: {e}"))?;

    let (input_height, input_width) = state.preprocessor.input_shape();
    info!(
        address = %addr,
        model = state.classifier.model_name(),
        input_height,
        input_width,
        device = device_label(state.classifier.device()),
        timeout_secs = config.request_timeout_secs,
        max_body_bytes = config.max_body_bytes,
        "classification server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
