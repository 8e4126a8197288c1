//! The `NerModel` wrapper: lifecycle, lazy loading and prediction.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use candle_core::Device;
use tokenizers::Tokenizer;
use tokio::sync::RwLock;

use ner_core::config::ModelConfig;
use ner_core::error::CoreResult;
use ner_core::traits::EntityPredictor;
use ner_core::types::Entity;

use crate::decode::decode_entities;
use crate::device::{device_label, select_device};
use crate::error::{ModelError, ModelResult};
use crate::forward::classify_tokens;
use crate::labels::LabelMap;
use crate::loader::{load_classifier_weights, load_encoder_config};
use crate::metrics::ModelMetrics;
use crate::weights::TokenClassifierWeights;

/// Everything resident after a successful load. Immutable once built;
/// shared with inference tasks via `Arc`.
pub(crate) struct LoadedModel {
    pub weights: TokenClassifierWeights,
    pub tokenizer: Tokenizer,
    pub labels: LabelMap,
}

enum ModelState {
    Unloaded,
    Loaded(Arc<LoadedModel>),
}

/// Token-classification model wrapper.
///
/// Constructed once at startup and handed to the server as an
/// `Arc<dyn EntityPredictor>`. The load transition is the only mutation of
/// shared state and is serialized by the write lock: concurrent first
/// callers block, the losers re-check the state and return without
/// reloading. The `loaded` flag is true iff weights, tokenizer and label
/// map are all resident.
pub struct NerModel {
    model_name: String,
    model_dir: PathBuf,
    max_sequence_length: usize,
    device: Device,
    device_name: String,
    state: RwLock<ModelState>,
    loaded: AtomicBool,
    metrics: ModelMetrics,
}

impl NerModel {
    /// Create an unloaded wrapper. The device is probed here; weights stay
    /// on disk until `ensure_loaded()`.
    pub fn new(config: &ModelConfig, metrics: ModelMetrics) -> Self {
        let device = select_device(0);
        let device_name = device_label(&device, 0);
        Self {
            model_name: config.name.clone(),
            model_dir: config.model_dir(),
            max_sequence_length: config.max_sequence_length,
            device,
            device_name,
            state: RwLock::new(ModelState::Unloaded),
            loaded: AtomicBool::new(false),
            metrics,
        }
    }

    /// Load tokenizer, weights and label map if not already resident.
    ///
    /// Idempotent; a second call after success is a no-op. The blocking
    /// file and tensor work runs on the blocking pool while the write
    /// lock holds back concurrent first requests.
    pub async fn ensure_loaded(&self) -> ModelResult<()> {
        if self.loaded.load(Ordering::SeqCst) {
            return Ok(());
        }

        let mut state = self.state.write().await;
        // Lost the race to another loader
        if matches!(*state, ModelState::Loaded(_)) {
            return Ok(());
        }

        tracing::info!(
            "Loading token-classification model '{}' onto {}",
            self.model_name,
            self.device_name
        );
        let timer = self.metrics.load_seconds.start_timer();
        let started = Instant::now();

        let model_dir = self.model_dir.clone();
        let device = self.device.clone();
        let inner = tokio::task::spawn_blocking(move || load_model(&model_dir, &device))
            .await
            .map_err(|e| ModelError::LoadError {
                message: format!("load task join failed: {}", e),
            })??;

        *state = ModelState::Loaded(Arc::new(inner));
        self.loaded.store(true, Ordering::SeqCst);
        timer.observe_duration();

        tracing::info!(
            "Model loaded successfully in {:.2} seconds (using {})",
            started.elapsed().as_secs_f64(),
            self.device_name
        );
        Ok(())
    }

    /// Extract entities from `text`, loading the model first if needed.
    ///
    /// The tokenize/forward/decode pipeline is CPU- or accelerator-bound,
    /// so it runs on the blocking pool rather than the request loop.
    pub async fn predict(&self, text: &str, entity_type: &str) -> ModelResult<Vec<Entity>> {
        self.ensure_loaded().await?;

        let inner = {
            let state = self.state.read().await;
            match &*state {
                ModelState::Loaded(inner) => Arc::clone(inner),
                ModelState::Unloaded => {
                    return Err(ModelError::InferenceError {
                        message: "model state lost after load".to_string(),
                    });
                }
            }
        };

        let timer = self.metrics.inference_seconds.start_timer();
        let prompt = build_prompt(entity_type);
        let text = text.to_string();
        let requested_type = entity_type.to_string();
        let max_len = self.max_sequence_length;

        let result = tokio::task::spawn_blocking(move || {
            run_inference(&inner, &prompt, &text, &requested_type, max_len)
        })
        .await
        .map_err(|e| ModelError::InferenceError {
            message: format!("inference task join failed: {}", e),
        })?;

        timer.observe_duration();
        result
    }
}

/// Instruction prompt embedded ahead of the input as segment 0.
pub(crate) fn build_prompt(entity_type: &str) -> String {
    format!("Find {} in:", entity_type)
}

fn load_model(model_dir: &std::path::Path, device: &Device) -> ModelResult<LoadedModel> {
    let (config, labels) = load_encoder_config(model_dir)?;

    let tokenizer_path = model_dir.join("tokenizer.json");
    let tokenizer = Tokenizer::from_file(&tokenizer_path).map_err(|e| ModelError::LoadError {
        message: format!(
            "tokenizer load failed at {}: {}",
            tokenizer_path.display(),
            e
        ),
    })?;

    let weights = load_classifier_weights(model_dir, &config, device)?;

    Ok(LoadedModel {
        weights,
        tokenizer,
        labels,
    })
}

fn run_inference(
    model: &LoadedModel,
    prompt: &str,
    text: &str,
    requested_type: &str,
    max_len: usize,
) -> ModelResult<Vec<Entity>> {
    let encoding = model
        .tokenizer
        .encode((prompt, text), true)
        .map_err(|e| ModelError::TokenizationError {
            message: format!("{}", e),
        })?;

    let len = encoding.get_ids().len().min(max_len);
    if len == 0 {
        return Ok(Vec::new());
    }

    let probs = classify_tokens(
        &model.weights,
        &encoding.get_ids()[..len],
        &encoding.get_type_ids()[..len],
        &encoding.get_attention_mask()[..len],
    )?;

    let sequence_ids = encoding.get_sequence_ids();
    Ok(decode_entities(
        &probs,
        &encoding.get_offsets()[..len],
        &sequence_ids[..len],
        &encoding.get_special_tokens_mask()[..len],
        &model.labels,
        text,
        requested_type,
    ))
}

#[async_trait]
impl EntityPredictor for NerModel {
    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn device_name(&self) -> &str {
        &self.device_name
    }

    fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    async fn ensure_loaded(&self) -> CoreResult<()> {
        NerModel::ensure_loaded(self).await.map_err(Into::into)
    }

    async fn predict(&self, text: &str, entity_type: &str) -> CoreResult<Vec<Entity>> {
        NerModel::predict(self, text, entity_type)
            .await
            .map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prometheus::Registry;

    fn test_model(dir: &str) -> NerModel {
        let mut config = ModelConfig::default();
        config.name = "missing/model".to_string();
        config.cache_dir = PathBuf::from(dir);
        let metrics = ModelMetrics::register(&Registry::new()).unwrap();
        NerModel::new(&config, metrics)
    }

    #[test]
    fn test_prompt_embeds_entity_type() {
        assert_eq!(build_prompt("ORGANIZATION"), "Find ORGANIZATION in:");
    }

    #[test]
    fn test_new_model_starts_unloaded() {
        let model = test_model("/nonexistent");
        assert!(!model.is_loaded());
        assert_eq!(model.model_name(), "missing/model");
        #[cfg(not(any(feature = "cuda", feature = "metal")))]
        assert_eq!(model.device_name(), "cpu");
    }

    #[tokio::test]
    async fn test_ensure_loaded_fails_for_missing_directory() {
        let model = test_model("/nonexistent");
        let err = model.ensure_loaded().await.unwrap_err();
        assert!(matches!(
            err,
            ModelError::LoadError { .. } | ModelError::ConfigError { .. }
        ));
        assert!(!model.is_loaded());
    }

    #[tokio::test]
    async fn test_predict_surfaces_load_failure() {
        let model = test_model("/nonexistent");
        assert!(model.predict("some text", "PERSON").await.is_err());
    }
}
