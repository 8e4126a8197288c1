//! Forward pass for the token-classification encoder.
//!
//! Plain-tensor implementation: embeddings sum, LayerNorm, a stack of
//! self-attention + FFN layers with residuals, then the classifier
//! projection and a per-token softmax. Candle tensors carry no gradient
//! state, so inference runs without any gradient tracking.

use candle_core::Tensor;

use crate::error::{ModelError, ModelResult};
use crate::weights::{EncoderLayerWeights, TokenClassifierWeights};

fn infer_err(op: &str, e: candle_core::Error) -> ModelError {
    ModelError::InferenceError {
        message: format!("{} failed: {}", op, e),
    }
}

/// Run the encoder and classifier over one tokenized sequence.
///
/// Returns per-token label probabilities, shape `[seq_len][num_labels]`.
pub fn classify_tokens(
    weights: &TokenClassifierWeights,
    token_ids: &[u32],
    token_type_ids: &[u32],
    attention_mask: &[u32],
) -> ModelResult<Vec<Vec<f32>>> {
    let device = &weights.device;
    let config = &weights.config;
    let seq_len = token_ids.len();

    if seq_len == 0 {
        return Err(ModelError::InferenceError {
            message: "empty token sequence".to_string(),
        });
    }

    let input_ids = Tensor::from_slice(token_ids, (1, seq_len), device)
        .map_err(|e| infer_err("input_ids tensor", e))?;

    let token_type_tensor = Tensor::from_slice(token_type_ids, (1, seq_len), device)
        .map_err(|e| infer_err("token_type tensor", e))?;

    let position_ids: Vec<u32> = (0..seq_len as u32).collect();
    let position_tensor = Tensor::from_slice(&position_ids, (1, seq_len), device)
        .map_err(|e| infer_err("position_ids tensor", e))?;

    // Additive attention mask: 0.0 for real tokens, -1e4 for padding.
    let mask_values: Vec<f32> = attention_mask
        .iter()
        .map(|&m| if m == 0 { -1e4 } else { 0.0 })
        .collect();
    let extended_mask = Tensor::from_slice(&mask_values, (1, 1, 1, seq_len), device)
        .map_err(|e| infer_err("attention mask tensor", e))?;

    // Embedding lookups
    let word_embeds = embed_lookup(
        &weights.embeddings.word_embeddings,
        &input_ids,
        seq_len,
        config.hidden_size,
        "word",
    )?;
    let position_embeds = embed_lookup(
        &weights.embeddings.position_embeddings,
        &position_tensor,
        seq_len,
        config.hidden_size,
        "position",
    )?;
    let token_type_embeds = embed_lookup(
        &weights.embeddings.token_type_embeddings,
        &token_type_tensor,
        seq_len,
        config.hidden_size,
        "token_type",
    )?;

    let embeddings = ((word_embeds + position_embeds).map_err(|e| infer_err("embedding add", e))?
        + token_type_embeds)
        .map_err(|e| infer_err("embedding add", e))?;

    let mut hidden_states = layer_norm(
        &embeddings,
        &weights.embeddings.layer_norm_weight,
        &weights.embeddings.layer_norm_bias,
        config.layer_norm_eps,
    )?;

    for layer in &weights.encoder_layers {
        hidden_states = encoder_layer_forward(&hidden_states, layer, &extended_mask, weights)?;
    }

    // Classifier head: [1, seq, hidden] -> [1, seq, num_labels]
    let logits = linear(
        &hidden_states,
        &weights.classifier_weight,
        &weights.classifier_bias,
        "classifier",
    )?;

    let probs = candle_nn::ops::softmax(&logits, 2).map_err(|e| infer_err("label softmax", e))?;

    probs
        .squeeze(0)
        .map_err(|e| infer_err("probs squeeze", e))?
        .to_vec2::<f32>()
        .map_err(|e| infer_err("probs to_vec2", e))
}

/// Gather embedding rows for a `[1, seq]` id tensor.
fn embed_lookup(
    table: &Tensor,
    ids: &Tensor,
    seq_len: usize,
    hidden_size: usize,
    what: &str,
) -> ModelResult<Tensor> {
    table
        .index_select(
            &ids.flatten_all()
                .map_err(|e| infer_err(&format!("{} ids flatten", what), e))?,
            0,
        )
        .map_err(|e| infer_err(&format!("{} embedding lookup", what), e))?
        .reshape((1, seq_len, hidden_size))
        .map_err(|e| infer_err(&format!("{} embedding reshape", what), e))
}

/// `x @ W^T + b` with a `[out, in]` weight and `[out]` bias.
fn linear(x: &Tensor, weight: &Tensor, bias: &Tensor, what: &str) -> ModelResult<Tensor> {
    x.broadcast_matmul(
        &weight
            .t()
            .map_err(|e| infer_err(&format!("{} weight transpose", what), e))?,
    )
    .map_err(|e| infer_err(&format!("{} matmul", what), e))?
    .broadcast_add(bias)
    .map_err(|e| infer_err(&format!("{} bias add", what), e))
}

/// LayerNorm over the last dimension.
fn layer_norm(
    hidden_states: &Tensor,
    weight: &Tensor,
    bias: &Tensor,
    eps: f64,
) -> ModelResult<Tensor> {
    let mean = hidden_states
        .mean_keepdim(2)
        .map_err(|e| infer_err("layer_norm mean", e))?;

    let diff = hidden_states
        .broadcast_sub(&mean)
        .map_err(|e| infer_err("layer_norm diff", e))?;

    let variance = diff
        .sqr()
        .map_err(|e| infer_err("layer_norm sqr", e))?
        .mean_keepdim(2)
        .map_err(|e| infer_err("layer_norm variance", e))?;

    let denom = (variance + eps)
        .map_err(|e| infer_err("layer_norm add eps", e))?
        .sqrt()
        .map_err(|e| infer_err("layer_norm sqrt", e))?;

    diff.broadcast_div(&denom)
        .map_err(|e| infer_err("layer_norm div", e))?
        .broadcast_mul(weight)
        .map_err(|e| infer_err("layer_norm mul weight", e))?
        .broadcast_add(bias)
        .map_err(|e| infer_err("layer_norm add bias", e))
}

/// One encoder layer: self-attention + FFN, each with residual + LayerNorm.
fn encoder_layer_forward(
    hidden_states: &Tensor,
    layer: &EncoderLayerWeights,
    extended_mask: &Tensor,
    weights: &TokenClassifierWeights,
) -> ModelResult<Tensor> {
    let config = &weights.config;

    let attention_output = self_attention(hidden_states, layer, extended_mask, weights)?;

    let hidden_states = layer_norm(
        &(hidden_states + &attention_output).map_err(|e| infer_err("attention residual", e))?,
        &layer.attention.layer_norm_weight,
        &layer.attention.layer_norm_bias,
        config.layer_norm_eps,
    )?;

    let intermediate = linear(
        &hidden_states,
        &layer.ffn.intermediate_weight,
        &layer.ffn.intermediate_bias,
        "ffn intermediate",
    )?
    .gelu_erf()
    .map_err(|e| infer_err("ffn gelu", e))?;

    let ffn_output = linear(
        &intermediate,
        &layer.ffn.output_weight,
        &layer.ffn.output_bias,
        "ffn output",
    )?;

    layer_norm(
        &(hidden_states + ffn_output).map_err(|e| infer_err("ffn residual", e))?,
        &layer.ffn.layer_norm_weight,
        &layer.ffn.layer_norm_bias,
        config.layer_norm_eps,
    )
}

/// Multi-head self-attention with the additive mask.
fn self_attention(
    hidden_states: &Tensor,
    layer: &EncoderLayerWeights,
    extended_mask: &Tensor,
    weights: &TokenClassifierWeights,
) -> ModelResult<Tensor> {
    let att = &layer.attention;
    let config = &weights.config;
    let num_heads = config.num_attention_heads;
    let head_dim = config.hidden_size / num_heads;

    let (batch, seq_len, _) = hidden_states
        .dims3()
        .map_err(|e| infer_err("attention dims3", e))?;

    let query = linear(hidden_states, &att.query_weight, &att.query_bias, "query")?;
    let key = linear(hidden_states, &att.key_weight, &att.key_bias, "key")?;
    let value = linear(hidden_states, &att.value_weight, &att.value_bias, "value")?;

    // [batch, seq, hidden] -> [batch, heads, seq, head_dim]
    let split_heads = |t: Tensor, what: &str| -> ModelResult<Tensor> {
        t.reshape((batch, seq_len, num_heads, head_dim))
            .map_err(|e| infer_err(&format!("{} reshape", what), e))?
            .transpose(1, 2)
            .map_err(|e| infer_err(&format!("{} transpose", what), e))?
            .contiguous()
            .map_err(|e| infer_err(&format!("{} contiguous", what), e))
    };

    let query = split_heads(query, "query")?;
    let key = split_heads(key, "key")?;
    let value = split_heads(value, "value")?;

    let scores = (query
        .matmul(
            &key.transpose(2, 3)
                .map_err(|e| infer_err("key transpose for scores", e))?
                .contiguous()
                .map_err(|e| infer_err("key contiguous for scores", e))?,
        )
        .map_err(|e| infer_err("attention scores matmul", e))?
        / (head_dim as f64).sqrt())
    .map_err(|e| infer_err("attention scores scale", e))?;

    let scores = scores
        .broadcast_add(extended_mask)
        .map_err(|e| infer_err("attention mask add", e))?;

    let attention_probs =
        candle_nn::ops::softmax(&scores, 3).map_err(|e| infer_err("attention softmax", e))?;

    let context = attention_probs
        .matmul(&value)
        .map_err(|e| infer_err("attention context matmul", e))?
        .transpose(1, 2)
        .map_err(|e| infer_err("attention context transpose", e))?
        .contiguous()
        .map_err(|e| infer_err("attention context contiguous", e))?
        .reshape((batch, seq_len, config.hidden_size))
        .map_err(|e| infer_err("attention context reshape", e))?;

    linear(&context, &att.output_weight, &att.output_bias, "attention output")
}
