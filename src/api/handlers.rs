//! API request handlers

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::{
    config::WorkerConfig,
    middleware::InputValidator,
    observability::{HealthChecker, MetricsCollector},
    worker::BatchReconciler,
};

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<BatchReconciler>,
    pub health_checker: Arc<HealthChecker>,
    pub metrics: Arc<MetricsCollector>,
    pub limits: WorkerConfig,
}

/// Request to run one processing cycle
#[derive(Debug, Default, Deserialize)]
pub struct GenerateEmbeddingsRequest {
    /// Falls back to the configured default when absent
    #[serde(default)]
    pub max_batch_size: Option<usize>,
}

/// Response when the cycle could not run at all
#[derive(Debug, Serialize)]
pub struct CycleErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Generic error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Drain one batch from the queue and embed it. An empty body uses defaults.
pub async fn generate_embeddings(State(state): State<AppState>, body: Bytes) -> Response {
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        GenerateEmbeddingsRequest::default()
    } else {
        match serde_json::from_slice::<GenerateEmbeddingsRequest>(&body) {
            Ok(req) => req,
            Err(e) => return bad_request(format!("Invalid request body: {}", e)),
        }
    };

    let max_batch_size = req
        .max_batch_size
        .unwrap_or(state.limits.default_batch_size);

    if let Err(e) =
        InputValidator::validate_batch_size(max_batch_size, state.limits.max_batch_size)
    {
        return bad_request(e.to_string());
    }

    match state.reconciler.run_cycle(max_batch_size).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            error!("Embedding cycle failed: {}", e);
            let body = CycleErrorResponse {
                success: false,
                error: e.to_string(),
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
        }
    }
}

fn bad_request(error: String) -> Response {
    (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })).into_response()
}
