//! API error kinds and their HTTP mapping.
//!
//! Failure taxonomy: request validation (422 with structured field
//! detail), authentication (401/403), model runtime (500 with a generic
//! message). Every kind is terminal for the triggering request; none is
//! retried.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;

/// One field-level validation failure, shaped like the framework detail
/// objects API clients already parse.
#[derive(Debug, Clone, Serialize)]
pub struct FieldError {
    /// Location path of the failing field, e.g. `["body", "text"]`
    pub loc: Vec<String>,
    /// Human-readable message
    pub msg: String,
    /// Machine-readable error code
    #[serde(rename = "type")]
    pub kind: String,
}

impl FieldError {
    pub fn new(loc: &[&str], msg: &str, kind: &str) -> Self {
        Self {
            loc: loc.iter().map(|s| s.to_string()).collect(),
            msg: msg.to_string(),
            kind: kind.to_string(),
        }
    }
}

/// Error kinds surfaced by the HTTP layer.
#[derive(Debug)]
pub enum ApiError {
    /// Request schema violation -> 422 with per-field detail
    Validation(Vec<FieldError>),
    /// No credential supplied -> 401
    MissingApiKey,
    /// Credential did not match -> 403
    InvalidApiKey,
    /// Model load/inference failure -> 500
    Prediction(String),
    /// Anything else -> 500
    Internal(String),
}

const WWW_AUTHENTICATE_VALUE: &str = "APIKey X-API-Key";

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": errors })),
            )
                .into_response(),
            ApiError::MissingApiKey => (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, WWW_AUTHENTICATE_VALUE)],
                Json(json!({ "detail": "API key missing" })),
            )
                .into_response(),
            ApiError::InvalidApiKey => (
                StatusCode::FORBIDDEN,
                [(header::WWW_AUTHENTICATE, WWW_AUTHENTICATE_VALUE)],
                Json(json!({ "detail": "Invalid API key" })),
            )
                .into_response(),
            ApiError::Prediction(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "detail": format!("Error during prediction: {}", message) })),
            )
                .into_response(),
            ApiError::Internal(message) => {
                tracing::error!("Internal server error: {}", message);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "detail": "Internal server error" })),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_error_serializes_type_key() {
        let err = FieldError::new(
            &["body", "text"],
            "ensure this value has at least 1 characters",
            "value_error.any_str.min_length",
        );
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["loc"][1], "text");
        assert_eq!(json["type"], "value_error.any_str.min_length");
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ApiError::Validation(vec![]).into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::MissingApiKey.into_response().status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::InvalidApiKey.into_response().status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Prediction("boom".into()).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
