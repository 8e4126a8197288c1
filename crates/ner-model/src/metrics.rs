//! Model-level latency instruments.

use prometheus::{Histogram, HistogramOpts, Registry};

/// Histograms tracking model load and inference latency.
///
/// Registered against the caller-supplied registry so the server exports
/// them alongside its HTTP metrics; the model crate never owns a registry.
#[derive(Clone)]
pub struct ModelMetrics {
    pub load_seconds: Histogram,
    pub inference_seconds: Histogram,
}

impl ModelMetrics {
    /// Create and register the model histograms.
    pub fn register(registry: &Registry) -> Result<Self, prometheus::Error> {
        let load_seconds = Histogram::with_opts(HistogramOpts::new(
            "model_loading_seconds",
            "Time to load model",
        ))?;
        registry.register(Box::new(load_seconds.clone()))?;

        let inference_seconds = Histogram::with_opts(HistogramOpts::new(
            "model_inference_seconds",
            "Time for model inference",
        ))?;
        registry.register(Box::new(inference_seconds.clone()))?;

        Ok(Self {
            load_seconds,
            inference_seconds,
        })
    }
}
