//! Weight and config loading for token-classification checkpoints.
//!
//! Reads a local model directory laid out the HuggingFace way:
//!   - `config.json`: encoder geometry plus the `id2label` map
//!   - `model.safetensors`: weights in `BertForTokenClassification` layout
//!     (`bert.embeddings.*`, `bert.encoder.layer.{i}.*`, `classifier.*`)

use std::collections::HashMap;
use std::path::Path;

use candle_core::{DType, Device};
use candle_nn::VarBuilder;

use crate::error::{ModelError, ModelResult};
use crate::labels::LabelMap;
use crate::weights::{
    AttentionWeights, EmbeddingWeights, EncoderConfig, EncoderLayerWeights, FfnWeights,
    TokenClassifierWeights,
};

/// Load encoder config and label vocabulary from `config.json`.
pub fn load_encoder_config(model_dir: &Path) -> ModelResult<(EncoderConfig, LabelMap)> {
    let config_path = model_dir.join("config.json");
    let content = std::fs::read_to_string(&config_path).map_err(|e| ModelError::LoadError {
        message: format!("config.json not readable at {}: {}", config_path.display(), e),
    })?;

    #[derive(serde::Deserialize)]
    struct RawConfig {
        #[serde(default = "default_vocab")]
        vocab_size: usize,
        hidden_size: Option<usize>,
        num_hidden_layers: Option<usize>,
        num_attention_heads: Option<usize>,
        intermediate_size: Option<usize>,
        max_position_embeddings: Option<usize>,
        #[serde(default = "default_type_vocab")]
        type_vocab_size: usize,
        #[serde(default = "default_layer_norm_eps", alias = "layer_norm_epsilon")]
        layer_norm_eps: f64,
        id2label: Option<HashMap<String, String>>,
    }

    fn default_vocab() -> usize {
        30522
    }
    fn default_type_vocab() -> usize {
        2
    }
    fn default_layer_norm_eps() -> f64 {
        1e-12
    }

    let raw: RawConfig = serde_json::from_str(&content).map_err(|e| ModelError::ConfigError {
        message: format!("config.json parse failed at {}: {}", config_path.display(), e),
    })?;

    let id2label = raw.id2label.ok_or_else(|| ModelError::ConfigError {
        message: format!(
            "config.json at {} has no id2label map; a token-classification \
             checkpoint is required",
            config_path.display()
        ),
    })?;
    let labels = LabelMap::from_id2label(&id2label)?;

    let config = EncoderConfig {
        vocab_size: raw.vocab_size,
        hidden_size: raw.hidden_size.unwrap_or(768),
        num_hidden_layers: raw.num_hidden_layers.unwrap_or(12),
        num_attention_heads: raw.num_attention_heads.unwrap_or(12),
        intermediate_size: raw.intermediate_size.unwrap_or(3072),
        max_position_embeddings: raw.max_position_embeddings.unwrap_or(512),
        type_vocab_size: raw.type_vocab_size,
        layer_norm_eps: raw.layer_norm_eps,
        num_labels: labels.len(),
    };

    if config.hidden_size % config.num_attention_heads != 0 {
        return Err(ModelError::ConfigError {
            message: format!(
                "hidden_size {} is not divisible by num_attention_heads {}",
                config.hidden_size, config.num_attention_heads
            ),
        });
    }

    Ok((config, labels))
}

/// Load all model weights from `model.safetensors`.
pub fn load_classifier_weights(
    model_dir: &Path,
    config: &EncoderConfig,
    device: &Device,
) -> ModelResult<TokenClassifierWeights> {
    let safetensors_path = model_dir.join("model.safetensors");
    if !safetensors_path.exists() {
        return Err(ModelError::LoadError {
            message: format!(
                "model.safetensors not found at {}",
                safetensors_path.display()
            ),
        });
    }

    let vb = unsafe {
        VarBuilder::from_mmaped_safetensors(&[&safetensors_path], DType::F32, device).map_err(
            |e| ModelError::LoadError {
                message: format!(
                    "safetensors mmap failed at {}: {}",
                    safetensors_path.display(),
                    e
                ),
            },
        )?
    };

    let embeddings = load_embeddings(&vb, config)?;

    let mut encoder_layers = Vec::with_capacity(config.num_hidden_layers);
    for layer_idx in 0..config.num_hidden_layers {
        encoder_layers.push(load_encoder_layer(&vb, config, layer_idx)?);
    }

    let classifier_weight = get_tensor(
        &vb,
        &[config.num_labels, config.hidden_size],
        "classifier.weight",
    )?;
    let classifier_bias = get_tensor(&vb, &[config.num_labels], "classifier.bias")?;

    tracing::info!(
        "Token classifier loaded: {} layers, hidden_size={}, {} labels",
        config.num_hidden_layers,
        config.hidden_size,
        config.num_labels
    );

    Ok(TokenClassifierWeights {
        config: config.clone(),
        embeddings,
        encoder_layers,
        classifier_weight,
        classifier_bias,
        device: device.clone(),
    })
}

/// Fetch a tensor with a shape check, naming the tensor on failure.
fn get_tensor(vb: &VarBuilder, shape: &[usize], name: &str) -> ModelResult<candle_core::Tensor> {
    vb.get(shape, name).map_err(|e| ModelError::LoadError {
        message: format!("tensor '{}' load failed: {}", name, e),
    })
}

fn load_embeddings(vb: &VarBuilder, config: &EncoderConfig) -> ModelResult<EmbeddingWeights> {
    let h = config.hidden_size;
    Ok(EmbeddingWeights {
        word_embeddings: get_tensor(
            vb,
            &[config.vocab_size, h],
            "bert.embeddings.word_embeddings.weight",
        )?,
        position_embeddings: get_tensor(
            vb,
            &[config.max_position_embeddings, h],
            "bert.embeddings.position_embeddings.weight",
        )?,
        token_type_embeddings: get_tensor(
            vb,
            &[config.type_vocab_size, h],
            "bert.embeddings.token_type_embeddings.weight",
        )?,
        layer_norm_weight: get_tensor(vb, &[h], "bert.embeddings.LayerNorm.weight")?,
        layer_norm_bias: get_tensor(vb, &[h], "bert.embeddings.LayerNorm.bias")?,
    })
}

fn load_encoder_layer(
    vb: &VarBuilder,
    config: &EncoderConfig,
    layer_idx: usize,
) -> ModelResult<EncoderLayerWeights> {
    let h = config.hidden_size;
    let inter = config.intermediate_size;
    let prefix = format!("bert.encoder.layer.{}", layer_idx);

    let attention = AttentionWeights {
        query_weight: get_tensor(vb, &[h, h], &format!("{}.attention.self.query.weight", prefix))?,
        query_bias: get_tensor(vb, &[h], &format!("{}.attention.self.query.bias", prefix))?,
        key_weight: get_tensor(vb, &[h, h], &format!("{}.attention.self.key.weight", prefix))?,
        key_bias: get_tensor(vb, &[h], &format!("{}.attention.self.key.bias", prefix))?,
        value_weight: get_tensor(vb, &[h, h], &format!("{}.attention.self.value.weight", prefix))?,
        value_bias: get_tensor(vb, &[h], &format!("{}.attention.self.value.bias", prefix))?,
        output_weight: get_tensor(
            vb,
            &[h, h],
            &format!("{}.attention.output.dense.weight", prefix),
        )?,
        output_bias: get_tensor(vb, &[h], &format!("{}.attention.output.dense.bias", prefix))?,
        layer_norm_weight: get_tensor(
            vb,
            &[h],
            &format!("{}.attention.output.LayerNorm.weight", prefix),
        )?,
        layer_norm_bias: get_tensor(
            vb,
            &[h],
            &format!("{}.attention.output.LayerNorm.bias", prefix),
        )?,
    };

    let ffn = FfnWeights {
        intermediate_weight: get_tensor(
            vb,
            &[inter, h],
            &format!("{}.intermediate.dense.weight", prefix),
        )?,
        intermediate_bias: get_tensor(vb, &[inter], &format!("{}.intermediate.dense.bias", prefix))?,
        output_weight: get_tensor(vb, &[h, inter], &format!("{}.output.dense.weight", prefix))?,
        output_bias: get_tensor(vb, &[h], &format!("{}.output.dense.bias", prefix))?,
        layer_norm_weight: get_tensor(vb, &[h], &format!("{}.output.LayerNorm.weight", prefix))?,
        layer_norm_bias: get_tensor(vb, &[h], &format!("{}.output.LayerNorm.bias", prefix))?,
    };

    Ok(EncoderLayerWeights { attention, ffn })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_encoder_config_missing_dir() {
        let result = load_encoder_config(Path::new("/nonexistent/model-dir"));
        assert!(result.is_err());
    }
}
