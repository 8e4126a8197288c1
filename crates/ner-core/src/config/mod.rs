//! Configuration management for the NER service.
//!
//! Settings are read once at process start and never mutated afterwards.
//! Invalid configuration is fatal to startup; there are no retries and no
//! fallback values for malformed input.

mod sub_configs;

#[cfg(test)]
mod tests;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

pub use sub_configs::{
    CorsConfig, LoggingConfig, MetricsConfig, ModelConfig, SecurityConfig, ServerConfig,
    StorageConfig,
};

fn default_project_name() -> String {
    "ner-service".to_string()
}

fn default_api_version() -> String {
    "v1".to_string()
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Project name used in logs and the server banner
    #[serde(default = "default_project_name")]
    pub project_name: String,
    /// API version segment mounted under `/api/{version}`
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub security: SecurityConfig,
    #[serde(default)]
    pub cors: CorsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            project_name: default_project_name(),
            api_version: default_api_version(),
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            security: SecurityConfig::default(),
            cors: CorsConfig::default(),
            logging: LoggingConfig::default(),
            storage: StorageConfig::default(),
            metrics: MetricsConfig::default(),
        }
    }
}

impl Settings {
    /// Load configuration from files and environment.
    ///
    /// Sources are layered in order:
    /// 1. `config/default.toml` (base settings, optional)
    /// 2. `config/{NER_ENV}.toml` (environment-specific, optional)
    /// 3. Environment variables with `NER` prefix (`NER__SERVER__PORT`)
    /// 4. Flat environment variables matching the deployment convention
    ///    (`PORT`, `MODEL_NAME`, `API_KEY`, ...)
    pub fn load() -> CoreResult<Self> {
        let env = std::env::var("NER_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{}", env)).required(false))
            .add_source(config::Environment::with_prefix("NER").separator("__"));

        let mut settings: Settings = builder.build()?.try_deserialize()?;
        settings.apply_env_overrides();
        settings.validate()?;
        Ok(settings)
    }

    /// Load configuration from an explicit TOML file.
    pub fn from_file(path: &std::path::Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CoreError::ConfigError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let settings: Settings = toml::from_str(&content)
            .map_err(|e| CoreError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Apply flat environment variable overrides.
    ///
    /// These are the unprefixed names operators set in deployment manifests.
    /// They take precedence over file values but not over CLI flags.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(name) = std::env::var("PROJECT_NAME") {
            self.project_name = name;
        }
        if let Ok(host) = std::env::var("HOST") {
            self.server.host = host;
        }
        if let Ok(port) = std::env::var("PORT") {
            if let Ok(port) = port.parse::<u16>() {
                self.server.port = port;
            }
        }
        if let Ok(name) = std::env::var("MODEL_NAME") {
            self.model.name = name;
        }
        if let Ok(dir) = std::env::var("MODEL_CACHE_DIR") {
            self.model.cache_dir = dir.into();
        }
        if let Ok(enabled) = std::env::var("API_KEY_ENABLED") {
            self.security.api_key_enabled =
                enabled == "1" || enabled.to_lowercase() == "true";
        }
        if let Ok(key) = std::env::var("API_KEY") {
            self.security.api_key = key;
        }
        if let Ok(origins) = std::env::var("CORS_ORIGINS") {
            self.cors.origins = origins
                .split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect();
        }
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            self.logging.level = level.to_lowercase();
        }
        if let Ok(format) = std::env::var("LOG_FORMAT") {
            self.logging.format = format.to_lowercase();
        }
        if let Ok(backend) = std::env::var("STORAGE_TYPE") {
            self.storage.backend = backend;
        }
    }

    /// Validate configuration values. FAIL FAST on the first violation.
    pub fn validate(&self) -> CoreResult<()> {
        if self.server.host.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "server.host must be non-empty".into(),
            ));
        }

        if self.server.port == 0 {
            return Err(CoreError::ConfigError(
                "server.port must be in range 1-65535, got 0".into(),
            ));
        }

        if self.model.name.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "model.name must be non-empty".into(),
            ));
        }

        if self.model.max_sequence_length == 0 {
            return Err(CoreError::ConfigError(
                "model.max_sequence_length must be greater than 0".into(),
            ));
        }

        // An enforced but unset key would lock out every caller.
        if self.security.api_key_enabled && self.security.api_key.is_empty() {
            return Err(CoreError::ConfigError(
                "security.api_key must be set when security.api_key_enabled is true \
                 (set API_KEY or disable enforcement)"
                    .into(),
            ));
        }

        for origin in &self.cors.origins {
            if !origin.starts_with("http://") && !origin.starts_with("https://") {
                return Err(CoreError::ConfigError(format!(
                    "cors.origins entry '{}' must be an absolute http(s) URL",
                    origin
                )));
            }
        }

        match self.logging.format.as_str() {
            "json" | "text" => {}
            other => {
                return Err(CoreError::ConfigError(format!(
                    "logging.format must be 'json' or 'text', got '{}'",
                    other
                )));
            }
        }

        if self.logging.level.trim().is_empty() {
            return Err(CoreError::ConfigError(
                "logging.level must be non-empty".into(),
            ));
        }

        match self.storage.backend.as_str() {
            "local" | "s3" | "gcs" | "azure" => {}
            other => {
                return Err(CoreError::ConfigError(format!(
                    "storage.backend must be one of 'local', 's3', 'gcs', 'azure', got '{}'",
                    other
                )));
            }
        }

        Ok(())
    }
}
