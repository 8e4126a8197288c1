//! The prediction endpoint.

use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use ner_core::error::CoreError;
use ner_core::types::Entity;

use crate::error::{ApiError, FieldError};
use crate::state::AppState;

/// Request payload for `POST /api/v1/predict`.
#[derive(Debug, Deserialize)]
pub struct NerRequest {
    /// Text to analyze for named entities (min length 1)
    pub text: String,
    /// The type of entity to extract (min length 1)
    pub entity_type: String,
}

/// Response payload: extracted entities plus wall-clock processing time.
#[derive(Debug, Serialize)]
pub struct NerResponse {
    pub entities: Vec<Entity>,
    /// Processing time in seconds
    pub processing_time: f64,
}

/// `POST /api/v1/predict`: extract named entities from text.
pub async fn predict_entities(
    State(state): State<AppState>,
    payload: Result<Json<NerRequest>, JsonRejection>,
) -> Result<Json<NerResponse>, ApiError> {
    let Json(request) = payload.map_err(rejection_detail)?;
    validate_request(&request)?;

    let started = Instant::now();
    state.metrics.predictions_total.inc();
    state
        .metrics
        .request_text_length
        .observe(request.text.len() as f64);

    tracing::info!(
        "Processing NER request for entity type: {}",
        request.entity_type
    );

    match state
        .predictor
        .predict(&request.text, &request.entity_type)
        .await
    {
        Ok(entities) => {
            state
                .metrics
                .entities_found_total
                .with_label_values(&[&request.entity_type])
                .inc_by(entities.len() as u64);

            let processing_time = started.elapsed().as_secs_f64();
            tracing::info!(
                "Found {} entities in {:.2} seconds",
                entities.len(),
                processing_time
            );

            Ok(Json(NerResponse {
                entities,
                processing_time,
            }))
        }
        Err(err) => {
            state.metrics.prediction_errors_total.inc();
            tracing::error!("Prediction error: {}", err);
            Err(ApiError::Prediction(runtime_message(err)))
        }
    }
}

/// Unwrap the original model message from the boundary error kind.
fn runtime_message(err: CoreError) -> String {
    match err {
        CoreError::ModelRuntime { message } => message,
        other => other.to_string(),
    }
}

/// Map a body rejection (malformed JSON, missing or mistyped fields) to
/// the structured 422 detail shape.
fn rejection_detail(rejection: JsonRejection) -> ApiError {
    ApiError::Validation(vec![FieldError::new(
        &["body"],
        &rejection.body_text(),
        "value_error.jsondecode",
    )])
}

/// Enforce the schema's min-length constraints.
fn validate_request(request: &NerRequest) -> Result<(), ApiError> {
    let mut errors = Vec::new();
    if request.text.is_empty() {
        errors.push(FieldError::new(
            &["body", "text"],
            "ensure this value has at least 1 characters",
            "value_error.any_str.min_length",
        ));
    }
    if request.entity_type.is_empty() {
        errors.push(FieldError::new(
            &["body", "entity_type"],
            "ensure this value has at least 1 characters",
            "value_error.any_str.min_length",
        ));
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::Validation(errors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rejects_empty_text() {
        let request = NerRequest {
            text: String::new(),
            entity_type: "ORGANIZATION".to_string(),
        };
        let err = validate_request(&request).unwrap_err();
        match err {
            ApiError::Validation(errors) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].loc, vec!["body", "text"]);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_collects_both_fields() {
        let request = NerRequest {
            text: String::new(),
            entity_type: String::new(),
        };
        match validate_request(&request).unwrap_err() {
            ApiError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_validate_accepts_minimal_request() {
        let request = NerRequest {
            text: "x".to_string(),
            entity_type: "y".to_string(),
        };
        assert!(validate_request(&request).is_ok());
    }
}
