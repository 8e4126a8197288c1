//! Token-classification model wrapper for the NER service.
//!
//! Loads a pretrained BERT-style encoder with a per-token classifier head
//! from a local model directory (`config.json`, `tokenizer.json`,
//! `model.safetensors`) onto the best available device, and decodes the
//! per-token label probabilities into entity spans with character offsets.
//!
//! # Lifecycle
//!
//! [`NerModel`] starts unloaded. The first call to `ensure_loaded()` (or
//! the first prediction) loads tokenizer, weights and label map; the load
//! transition is serialized by a write lock so concurrent first callers
//! block instead of duplicating work. Once loaded, the model is read-only
//! and shared for the process lifetime.

pub mod decode;
pub mod device;
pub mod error;
pub mod labels;
pub mod loader;
pub mod metrics;
pub mod model;
pub mod weights;

mod forward;

pub use error::{ModelError, ModelResult};
pub use labels::LabelMap;
pub use metrics::ModelMetrics;
pub use model::NerModel;
