//! Error types for the model wrapper.

use thiserror::Error;

use ner_core::error::CoreError;

/// Result alias for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Failure modes of the token-classification wrapper.
///
/// At the [`ner_core::EntityPredictor`] boundary every variant collapses
/// into `CoreError::ModelRuntime` carrying the message, so the HTTP layer
/// sees a single runtime-failure kind.
#[derive(Debug, Error)]
pub enum ModelError {
    /// Weight, tokenizer or config loading failed.
    #[error("Model load failed: {message}")]
    LoadError { message: String },

    /// The model directory's config.json is unusable.
    #[error("Model config invalid: {message}")]
    ConfigError { message: String },

    /// Input text could not be tokenized.
    #[error("Tokenization failed: {message}")]
    TokenizationError { message: String },

    /// A tensor operation failed during the forward pass.
    #[error("Inference failed: {message}")]
    InferenceError { message: String },
}

impl From<ModelError> for CoreError {
    fn from(err: ModelError) -> Self {
        CoreError::ModelRuntime {
            message: err.to_string(),
        }
    }
}
