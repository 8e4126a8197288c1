//! HTTP request handlers.

mod health;
mod predict;

pub use health::{export_metrics, liveness, model_health, ModelHealthResponse};
pub use predict::{predict_entities, NerRequest, NerResponse};
