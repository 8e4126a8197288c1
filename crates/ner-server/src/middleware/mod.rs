//! Request middleware: API-key enforcement and HTTP instrumentation.

pub mod api_key;
pub mod http_metrics;
