//! Sub-configuration structures for the NER service.

use std::path::PathBuf;

use serde::{Deserialize, Deserializer, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Bind address (default: "0.0.0.0")
    #[serde(default = "default_host")]
    pub host: String,
    /// Listen port (default: 8000)
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Model configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelConfig {
    /// Checkpoint identifier; also the subdirectory of `cache_dir` holding
    /// `config.json`, `tokenizer.json` and `model.safetensors`.
    #[serde(default = "default_model_name")]
    pub name: String,

    /// Root directory for local model files (default: "./models")
    #[serde(default = "default_model_cache_dir")]
    pub cache_dir: PathBuf,

    /// Load weights at startup instead of on the first request
    #[serde(default)]
    pub preload: bool,

    /// Token budget per request; longer inputs are truncated
    #[serde(default = "default_max_sequence_length")]
    pub max_sequence_length: usize,
}

fn default_model_name() -> String {
    "dslim/bert-base-NER".to_string()
}

fn default_model_cache_dir() -> PathBuf {
    PathBuf::from("./models")
}

fn default_max_sequence_length() -> usize {
    512
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            cache_dir: default_model_cache_dir(),
            preload: false,
            max_sequence_length: default_max_sequence_length(),
        }
    }
}

impl ModelConfig {
    /// Directory holding this model's files.
    pub fn model_dir(&self) -> PathBuf {
        self.cache_dir.join(&self.name)
    }
}

/// API key enforcement configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SecurityConfig {
    /// Require an API key on `/api/{version}` routes (default: true)
    #[serde(default = "default_api_key_enabled")]
    pub api_key_enabled: bool,

    /// The shared-secret credential. Must be non-empty when enforcement
    /// is enabled; validated at startup.
    #[serde(default)]
    pub api_key: String,
}

fn default_api_key_enabled() -> bool {
    true
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            api_key_enabled: default_api_key_enabled(),
            api_key: String::new(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CorsConfig {
    /// Allowed origins. Accepts either an array or a single
    /// comma-separated string; empty means no cross-origin access.
    #[serde(default, deserialize_with = "deserialize_origins")]
    pub origins: Vec<String>,
}

/// Accept `["http://a", "http://b"]` or `"http://a, http://b"`.
fn deserialize_origins<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OriginList {
        List(Vec<String>),
        Csv(String),
    }

    match OriginList::deserialize(deserializer)? {
        OriginList::List(list) => Ok(list),
        OriginList::Csv(csv) => Ok(csv
            .split(',')
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty())
            .collect()),
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (default: "info"); `RUST_LOG` wins
    /// when set
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Formatter: "json" or "text" (default: "json")
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Optional file sink appended alongside the console
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

/// Storage backend selection. The service itself only carries the name;
/// nothing in the prediction path persists data.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    /// One of "local", "s3", "gcs", "azure" (default: "local")
    #[serde(default = "default_storage_backend")]
    pub backend: String,

    /// Local storage path (default: "./data")
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

fn default_storage_backend() -> String {
    "local".to_string()
}

fn default_storage_path() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: default_storage_backend(),
            path: default_storage_path(),
        }
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetricsConfig {
    /// Expose `/metrics` and record HTTP instrumentation (default: true)
    #[serde(default = "default_metrics_enabled")]
    pub enabled: bool,
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: default_metrics_enabled(),
        }
    }
}
