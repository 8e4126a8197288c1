//! HTTP API server for the NER service.
//!
//! Routes:
//!
//! - `POST /api/v1/predict`: entity extraction (API key required)
//! - `GET /api/v1/health`: model status (API key required)
//! - `GET /health`: unauthenticated liveness probe
//! - `GET /metrics`: Prometheus text exposition

pub mod error;
pub mod handlers;
pub mod logging;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use metrics::ApiMetrics;
pub use routes::build_router;
pub use state::AppState;
