//! Liveness, model-status and metrics endpoints.

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

use crate::error::ApiError;
use crate::state::AppState;

/// `GET /health`: fixed liveness response, no dependency checks.
pub async fn liveness() -> Json<serde_json::Value> {
    Json(json!({ "status": "healthy" }))
}

/// Body of the model-scoped health response.
#[derive(Debug, Serialize)]
pub struct ModelHealthResponse {
    pub status: &'static str,
    pub model_name: String,
    pub device: String,
    pub is_loaded: bool,
}

/// `GET /api/v1/health`: reports the current predictor state verbatim.
///
/// Does not trigger a load and does not verify the model answers
/// correctly; `is_loaded` stays false until the first prediction (or a
/// preload) has completed.
pub async fn model_health(State(state): State<AppState>) -> Json<ModelHealthResponse> {
    Json(ModelHealthResponse {
        status: "healthy",
        model_name: state.predictor.model_name().to_string(),
        device: state.predictor.device_name().to_string(),
        is_loaded: state.predictor.is_loaded(),
    })
}

/// `GET /metrics`: Prometheus text exposition of every registered
/// counter and histogram.
pub async fn export_metrics(State(state): State<AppState>) -> Result<Response, ApiError> {
    let body = state
        .metrics
        .export()
        .map_err(|e| ApiError::Internal(format!("metrics encoding failed: {}", e)))?;

    Ok((
        [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
        body,
    )
        .into_response())
}
