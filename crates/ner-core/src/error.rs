//! Error types for ner-core.
//!
//! [`CoreError`] is the error surfaced at the service boundary. Model-side
//! failures (load or inference) collapse into the single [`CoreError::ModelRuntime`]
//! kind carrying the original message; the HTTP layer maps each variant to a
//! status code.

use thiserror::Error;

/// Result alias used throughout the workspace.
pub type CoreResult<T> = Result<T, CoreError>;

/// Top-level error type for the NER service.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Configuration sources failed to load or deserialize.
    #[error("Config load error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    /// Configuration was built but failed validation.
    ///
    /// Always fatal at startup; the message names the offending field.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A request field value failed validation constraints.
    #[error("Validation error: {field} - {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Model load or inference failed.
    ///
    /// All model-side failure kinds are wrapped into this variant with the
    /// original message preserved. Never retried; terminal for the
    /// triggering request.
    #[error("Model runtime error: {message}")]
    ModelRuntime {
        /// The underlying failure message
        message: String,
    },
}
