//! Integration tests for the API endpoints.
//!
//! The router is driven in-process with a stub predictor, so no model
//! files are needed and every status-code path is exercised.

use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ner_core::config::Settings;
use ner_core::error::{CoreError, CoreResult};
use ner_core::traits::EntityPredictor;
use ner_core::types::Entity;
use ner_server::{build_router, ApiMetrics, AppState};

const STUB_MODEL_NAME: &str = "dslim/bert-base-NER";

/// Predictor stub returning canned entities or a canned failure.
struct StubPredictor {
    entities: Vec<Entity>,
    fail: bool,
}

impl StubPredictor {
    fn with_entities(entities: Vec<Entity>) -> Self {
        Self {
            entities,
            fail: false,
        }
    }

    fn failing() -> Self {
        Self {
            entities: Vec::new(),
            fail: true,
        }
    }
}

#[async_trait]
impl EntityPredictor for StubPredictor {
    fn model_name(&self) -> &str {
        STUB_MODEL_NAME
    }

    fn device_name(&self) -> &str {
        "cpu"
    }

    fn is_loaded(&self) -> bool {
        true
    }

    async fn ensure_loaded(&self) -> CoreResult<()> {
        Ok(())
    }

    async fn predict(&self, _text: &str, _entity_type: &str) -> CoreResult<Vec<Entity>> {
        if self.fail {
            return Err(CoreError::ModelRuntime {
                message: "Model prediction failed".to_string(),
            });
        }
        Ok(self.entities.clone())
    }
}

/// The two fixed entities from the canonical request scenario.
fn example_entities() -> Vec<Entity> {
    vec![
        Entity {
            text: "Microsoft".to_string(),
            start: 10,
            end: 19,
            entity_type: "ORGANIZATION".to_string(),
            score: 0.95,
        },
        Entity {
            text: "Seattle".to_string(),
            start: 33,
            end: 40,
            entity_type: "LOCATION".to_string(),
            score: 0.92,
        },
    ]
}

fn test_settings(api_key_enabled: bool) -> Settings {
    let mut settings = Settings::default();
    settings.security.api_key_enabled = api_key_enabled;
    settings.security.api_key = "test-secret".to_string();
    settings
}

fn test_app(settings: Settings, predictor: Arc<dyn EntityPredictor>) -> Router {
    let metrics = Arc::new(ApiMetrics::new().unwrap());
    let state = AppState::new(Arc::new(settings), predictor, metrics);
    build_router(state).unwrap()
}

/// App with auth disabled and the example stub.
fn open_app() -> Router {
    test_app(
        test_settings(false),
        Arc::new(StubPredictor::with_entities(example_entities())),
    )
}

fn predict_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

// ============================================================================
// Health endpoints
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let response = open_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({ "status": "healthy" }));
}

#[tokio::test]
async fn test_model_health_endpoint_reflects_predictor() {
    let response = open_app()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({
            "status": "healthy",
            "model_name": STUB_MODEL_NAME,
            "device": "cpu",
            "is_loaded": true
        })
    );
}

// ============================================================================
// Prediction endpoint
// ============================================================================

#[tokio::test]
async fn test_predict_endpoint_success() {
    let response = open_app()
        .oneshot(predict_request(json!({
            "text": "I work at Microsoft based in Seattle, Washington.",
            "entity_type": "ORGANIZATION"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;

    let entities = body["entities"].as_array().unwrap();
    assert_eq!(entities.len(), 2);
    assert_eq!(entities[0]["text"], "Microsoft");
    assert_eq!(entities[0]["entity_type"], "ORGANIZATION");
    assert_eq!(entities[1]["text"], "Seattle");
    assert_eq!(entities[1]["entity_type"], "LOCATION");
    assert!(body["processing_time"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn test_predict_endpoint_missing_entity_type() {
    let response = open_app()
        .oneshot(predict_request(json!({ "text": "I work at Microsoft." })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    assert!(body.get("detail").is_some());
}

#[tokio::test]
async fn test_predict_endpoint_empty_text() {
    let response = open_app()
        .oneshot(predict_request(json!({
            "text": "",
            "entity_type": "ORGANIZATION"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = body_json(response).await;
    let detail = body["detail"].as_array().unwrap();
    assert_eq!(detail[0]["loc"], json!(["body", "text"]));
}

#[tokio::test]
async fn test_predict_endpoint_invalid_json() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = open_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_json(response).await.get("detail").is_some());
}

#[tokio::test]
async fn test_predict_endpoint_model_error() {
    let app = test_app(test_settings(false), Arc::new(StubPredictor::failing()));

    let response = app
        .oneshot(predict_request(json!({
            "text": "I work at Microsoft based in Seattle, Washington.",
            "entity_type": "ORGANIZATION"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    let detail = body["detail"].as_str().unwrap();
    assert!(detail.contains("Error during prediction"), "got: {}", detail);
    assert!(detail.contains("Model prediction failed"), "got: {}", detail);
}

// ============================================================================
// API key enforcement
// ============================================================================

fn secured_app() -> Router {
    test_app(
        test_settings(true),
        Arc::new(StubPredictor::with_entities(example_entities())),
    )
}

#[tokio::test]
async fn test_missing_api_key_is_unauthorized() {
    let response = secured_app()
        .oneshot(Request::get("/api/v1/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await,
        json!({ "detail": "API key missing" })
    );
}

#[tokio::test]
async fn test_wrong_api_key_is_forbidden() {
    let response = secured_app()
        .oneshot(
            Request::get("/api/v1/health")
                .header("X-API-Key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(
        body_json(response).await,
        json!({ "detail": "Invalid API key" })
    );
}

#[tokio::test]
async fn test_api_key_accepted_from_header() {
    let response = secured_app()
        .oneshot(
            Request::get("/api/v1/health")
                .header("X-API-Key", "test-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_key_accepted_from_query() {
    let response = secured_app()
        .oneshot(
            Request::get("/api/v1/health?X-API-Key=test-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_api_key_accepted_from_cookie() {
    let response = secured_app()
        .oneshot(
            Request::get("/api/v1/health")
                .header(header::COOKIE, "X-API-Key=test-secret")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_header_takes_priority_over_query() {
    // A wrong header must fail even when the query carries the right key.
    let response = secured_app()
        .oneshot(
            Request::get("/api/v1/health?X-API-Key=test-secret")
                .header("X-API-Key", "wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_liveness_needs_no_api_key() {
    let response = secured_app()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_protected_predict_with_key_succeeds() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/predict")
        .header(header::CONTENT_TYPE, "application/json")
        .header("X-API-Key", "test-secret")
        .body(Body::from(
            json!({ "text": "Alice visited Paris.", "entity_type": "PERSON" }).to_string(),
        ))
        .unwrap();

    let response = secured_app().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

// ============================================================================
// Metrics endpoint
// ============================================================================

#[tokio::test]
async fn test_metrics_endpoint_exposes_counters() {
    let app = open_app();

    // Drive one prediction through the same router instance so counters move.
    let response = app
        .clone()
        .oneshot(predict_request(json!({
            "text": "I work at Microsoft based in Seattle, Washington.",
            "entity_type": "ORGANIZATION"
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(text.contains("api_ner_predictions_total 1"), "got: {}", text);
    assert!(text.contains("api_entities_found_total"));
    assert!(text.contains("http_requests_total"));
}

#[tokio::test]
async fn test_metrics_route_absent_when_disabled() {
    let mut settings = test_settings(false);
    settings.metrics.enabled = false;
    let app = test_app(
        settings,
        Arc::new(StubPredictor::with_entities(example_entities())),
    );

    let response = app
        .oneshot(Request::get("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
