//! Application state shared across handlers.

use std::sync::Arc;

use ner_core::config::Settings;
use ner_core::traits::EntityPredictor;

use crate::metrics::ApiMetrics;

/// Cloneable handle bundle passed to every handler via axum `State`.
///
/// The predictor is injected as a trait object so tests can swap the real
/// model for a stub; nothing in the request path touches global state.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub predictor: Arc<dyn EntityPredictor>,
    pub metrics: Arc<ApiMetrics>,
}

impl AppState {
    pub fn new(
        settings: Arc<Settings>,
        predictor: Arc<dyn EntityPredictor>,
        metrics: Arc<ApiMetrics>,
    ) -> Self {
        Self {
            settings,
            predictor,
            metrics,
        }
    }
}
