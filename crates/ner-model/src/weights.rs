//! Weight containers for the token-classification encoder.

use candle_core::{Device, Tensor};

/// Parsed `config.json` of a BERT-style encoder checkpoint.
#[derive(Debug, Clone)]
pub struct EncoderConfig {
    pub vocab_size: usize,
    pub hidden_size: usize,
    pub num_hidden_layers: usize,
    pub num_attention_heads: usize,
    pub intermediate_size: usize,
    pub max_position_embeddings: usize,
    pub type_vocab_size: usize,
    pub layer_norm_eps: f64,
    /// Classifier head width; equals the label vocabulary size.
    pub num_labels: usize,
}

/// Embedding layer weights (word + position + token type + LayerNorm).
pub struct EmbeddingWeights {
    pub word_embeddings: Tensor,
    pub position_embeddings: Tensor,
    pub token_type_embeddings: Tensor,
    pub layer_norm_weight: Tensor,
    pub layer_norm_bias: Tensor,
}

/// Self-attention weights for one encoder layer.
pub struct AttentionWeights {
    pub query_weight: Tensor,
    pub query_bias: Tensor,
    pub key_weight: Tensor,
    pub key_bias: Tensor,
    pub value_weight: Tensor,
    pub value_bias: Tensor,
    pub output_weight: Tensor,
    pub output_bias: Tensor,
    pub layer_norm_weight: Tensor,
    pub layer_norm_bias: Tensor,
}

/// Feed-forward weights for one encoder layer.
pub struct FfnWeights {
    pub intermediate_weight: Tensor,
    pub intermediate_bias: Tensor,
    pub output_weight: Tensor,
    pub output_bias: Tensor,
    pub layer_norm_weight: Tensor,
    pub layer_norm_bias: Tensor,
}

/// One encoder layer (attention + FFN).
pub struct EncoderLayerWeights {
    pub attention: AttentionWeights,
    pub ffn: FfnWeights,
}

/// Full token-classification model: encoder stack plus classifier head.
pub struct TokenClassifierWeights {
    pub config: EncoderConfig,
    pub embeddings: EmbeddingWeights,
    pub encoder_layers: Vec<EncoderLayerWeights>,
    /// Per-token classification projection `[num_labels, hidden_size]`
    pub classifier_weight: Tensor,
    pub classifier_bias: Tensor,
    pub device: Device,
}
