//! Prometheus metrics for the API surface.

use prometheus::{
    exponential_buckets, Encoder, Histogram, HistogramOpts, HistogramVec, IntCounter,
    IntCounterVec, Opts, Registry, TextEncoder,
};

/// All API-level instruments plus the registry they live in.
///
/// The registry is owned here rather than using the process-global
/// default, so tests can build isolated instances and the model
/// histograms register against the same explicit registry.
pub struct ApiMetrics {
    registry: Registry,
    /// Total prediction requests received
    pub predictions_total: IntCounter,
    /// Total prediction requests that failed in the model layer
    pub prediction_errors_total: IntCounter,
    /// Entities found, labelled by requested entity type
    pub entities_found_total: IntCounterVec,
    /// Distribution of request text lengths
    pub request_text_length: Histogram,
    /// HTTP requests by method, route template and status
    pub http_requests_total: IntCounterVec,
    /// HTTP latency by method and route template
    pub http_request_duration_seconds: HistogramVec,
}

impl ApiMetrics {
    /// Create a fresh registry with all API instruments registered.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let predictions_total = IntCounter::with_opts(Opts::new(
            "api_ner_predictions_total",
            "Total NER API predictions",
        ))?;
        registry.register(Box::new(predictions_total.clone()))?;

        let prediction_errors_total = IntCounter::with_opts(Opts::new(
            "api_ner_errors_total",
            "Total NER API errors",
        ))?;
        registry.register(Box::new(prediction_errors_total.clone()))?;

        let entities_found_total = IntCounterVec::new(
            Opts::new("api_entities_found_total", "Total entities found"),
            &["entity_type"],
        )?;
        registry.register(Box::new(entities_found_total.clone()))?;

        let request_text_length = Histogram::with_opts(
            HistogramOpts::new(
                "api_request_text_length",
                "Distribution of request text lengths",
            )
            .buckets(exponential_buckets(1.0, 4.0, 10)?),
        )?;
        registry.register(Box::new(request_text_length.clone()))?;

        let http_requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "HTTP request latency"),
            &["method", "endpoint"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        Ok(Self {
            registry,
            predictions_total,
            prediction_errors_total,
            entities_found_total,
            request_text_length,
            http_requests_total,
            http_request_duration_seconds,
        })
    }

    /// The registry backing these instruments; model metrics register here
    /// too so one exposition covers everything.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Render every registered metric in Prometheus text format.
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
