//! HTTP request count and latency instrumentation.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::state::AppState;

/// Observe every request's method, route, status and duration.
///
/// The route template (`/api/v1/predict`) is used as the endpoint label
/// when available, keeping label cardinality bounded; unmatched paths
/// fall back to the raw URI path.
pub async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().to_string();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map(|path| path.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let started = Instant::now();
    let response = next.run(request).await;
    let elapsed = started.elapsed().as_secs_f64();
    let status = response.status().as_u16().to_string();

    state
        .metrics
        .http_requests_total
        .with_label_values(&[&method, &endpoint, &status])
        .inc();
    state
        .metrics
        .http_request_duration_seconds
        .with_label_values(&[&method, &endpoint])
        .observe(elapsed);

    response
}
