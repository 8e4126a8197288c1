//! Trait seam between the HTTP layer and the model implementation.

use async_trait::async_trait;

use crate::error::CoreResult;
use crate::types::Entity;

/// Provider of entity predictions.
///
/// The server holds an `Arc<dyn EntityPredictor>` constructed once at
/// startup and passed into request handlers through application state;
/// there is no process-global model instance. Implementations must be
/// safe to share across request tasks.
#[async_trait]
pub trait EntityPredictor: Send + Sync {
    /// Identifier of the underlying checkpoint.
    fn model_name(&self) -> &str;

    /// Compute device the model runs on (`cuda:0`, `metal:0`, `cpu`).
    fn device_name(&self) -> &str;

    /// True once tokenizer and weights are resident.
    fn is_loaded(&self) -> bool;

    /// Load tokenizer and weights if not already loaded.
    ///
    /// Idempotent: a second call after a successful load is a no-op, and
    /// concurrent first callers must block on a single load rather than
    /// duplicate work.
    async fn ensure_loaded(&self) -> CoreResult<()>;

    /// Extract entities from `text`, conditioned on the requested
    /// `entity_type`. Triggers a load if the model is not yet resident.
    async fn predict(&self, text: &str, entity_type: &str) -> CoreResult<Vec<Entity>>;
}
