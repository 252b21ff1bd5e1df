//! API route configuration

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower::ServiceBuilder;
use tower_http::{limit::RequestBodyLimitLayer, trace::TraceLayer};

use crate::observability::HealthStatus;

use super::handlers::{self, AppState};

/// Build the complete API router with middleware
pub fn build_router(app_state: AppState, max_body_size: usize) -> Router {
    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/metrics", get(metrics_handler));

    let mut api_routes = Router::new()
        .route("/api/generate-embeddings", post(handlers::generate_embeddings));

    if max_body_size > 0 {
        api_routes = api_routes.layer(RequestBodyLimitLayer::new(max_body_size));
    }

    public_routes
        .merge(api_routes)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(app_state)
}

/// Root handler
async fn root_handler() -> impl IntoResponse {
    Json(json!({
        "service": "Embedding Worker",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running"
    }))
}

fn status_code(status: &HealthStatus) -> StatusCode {
    match status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Health check handler
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.health_checker.check_health().await;
    (status_code(&health.status), Json(health))
}

/// Liveness probe handler - always returns 200
async fn liveness_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.health_checker.liveness() {
        (StatusCode::OK, Json(json!({"status": "alive"})))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({"status": "dead"})))
    }
}

/// Readiness probe handler
async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    let health = state.health_checker.check_health().await;
    let code = status_code(&health.status);
    let readiness = if code == StatusCode::OK { "ready" } else { "not_ready" };

    (code, Json(json!({"status": readiness, "details": health})))
}

/// Metrics handler (Prometheus text format)
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut output = state.metrics.export_prometheus();

    if let Some(cb) = state.health_checker.circuit_breaker() {
        output.push_str("\n\n");
        output.push_str(&cb.export_prometheus("embedding_worker_circuit_breaker").await);
    }

    output
}
