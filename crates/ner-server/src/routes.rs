//! Router assembly.

use axum::http::{HeaderValue, Method};
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, CorsLayer};

use ner_core::config::CorsConfig;
use ner_core::error::{CoreError, CoreResult};

use crate::handlers;
use crate::middleware::{api_key, http_metrics};
use crate::state::AppState;

/// Build the service router.
///
/// The prediction and model-health routes live under
/// `/api/{api_version}` behind the API-key middleware; liveness and
/// metrics are unauthenticated. When metrics are disabled both the
/// `/metrics` route and the HTTP instrumentation layer are omitted.
pub fn build_router(state: AppState) -> CoreResult<Router> {
    let api = Router::new()
        .route("/predict", post(handlers::predict_entities))
        .route("/health", get(handlers::model_health))
        .layer(from_fn_with_state(state.clone(), api_key::require_api_key));

    let mut app = Router::new()
        .nest(&format!("/api/{}", state.settings.api_version), api)
        .route("/health", get(handlers::liveness));

    if state.settings.metrics.enabled {
        app = app
            .route("/metrics", get(handlers::export_metrics))
            .layer(from_fn_with_state(
                state.clone(),
                http_metrics::track_requests,
            ));
    }

    let app = app.layer(cors_layer(&state.settings.cors)?);
    Ok(app.with_state(state))
}

/// CORS policy from configuration. An empty origin list allows no
/// cross-origin access.
fn cors_layer(config: &CorsConfig) -> CoreResult<CorsLayer> {
    if config.origins.is_empty() {
        return Ok(CorsLayer::new());
    }

    let mut origins = Vec::with_capacity(config.origins.len());
    for origin in &config.origins {
        let value = origin.parse::<HeaderValue>().map_err(|e| {
            CoreError::ConfigError(format!(
                "cors.origins entry '{}' is not a valid header value: {}",
                origin, e
            ))
        })?;
        origins.push(value);
    }

    Ok(CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}
