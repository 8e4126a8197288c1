//! BIO span decoding over per-token label probabilities.
//!
//! The request is encoded as a sequence pair: segment 0 carries the
//! instruction prompt, segment 1 the user text. Only segment-1,
//! non-special tokens are decoded, so token offsets index the user text
//! directly.

use ner_core::types::Entity;

use crate::labels::{is_generic_stem, parse_bio, BioTag, LabelMap};

/// A span under construction during decoding.
struct OpenSpan {
    stem: String,
    start: usize,
    end: usize,
    score_sum: f32,
    token_count: usize,
}

impl OpenSpan {
    fn new(stem: &str, start: usize, end: usize, score: f32) -> Self {
        Self {
            stem: stem.to_string(),
            start,
            end,
            score_sum: score,
            token_count: 1,
        }
    }

    fn extend(&mut self, end: usize, score: f32) {
        self.end = end;
        self.score_sum += score;
        self.token_count += 1;
    }

    fn into_entity(self, text: &str, requested_type: &str) -> Option<Entity> {
        let span_text = text.get(self.start..self.end)?;
        if span_text.is_empty() {
            return None;
        }
        let entity_type = if is_generic_stem(&self.stem) {
            requested_type.to_string()
        } else {
            self.stem
        };
        let score = (self.score_sum / self.token_count as f32).clamp(0.0, 1.0);
        Some(Entity {
            text: span_text.to_string(),
            start: self.start,
            end: self.end,
            entity_type,
            score,
        })
    }
}

/// Index and probability of the highest-scoring label.
fn argmax(probs: &[f32]) -> Option<(usize, f32)> {
    let mut best: Option<(usize, f32)> = None;
    for (idx, &p) in probs.iter().enumerate() {
        if p.is_nan() {
            continue;
        }
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((idx, p)),
        }
    }
    best
}

/// Decode entity spans from per-token label probabilities.
///
/// `probs`, `offsets`, `sequence_ids` and `special_tokens` are parallel
/// per-token slices from the tokenizer encoding (already truncated to the
/// model's sequence budget). Spans keep their decoded type label; generic
/// stems inherit `requested_type`.
pub fn decode_entities(
    probs: &[Vec<f32>],
    offsets: &[(usize, usize)],
    sequence_ids: &[Option<usize>],
    special_tokens: &[u32],
    labels: &LabelMap,
    text: &str,
    requested_type: &str,
) -> Vec<Entity> {
    let mut entities = Vec::new();
    let mut open: Option<OpenSpan> = None;

    for (idx, token_probs) in probs.iter().enumerate() {
        let in_text_segment = sequence_ids.get(idx).copied().flatten() == Some(1);
        let is_special = special_tokens.get(idx).copied().unwrap_or(1) != 0;

        if !in_text_segment || is_special {
            if let Some(span) = open.take() {
                entities.extend(span.into_entity(text, requested_type));
            }
            continue;
        }

        let Some((label_id, score)) = argmax(token_probs) else {
            continue;
        };
        let label = labels.get(label_id).unwrap_or("O");
        let Some(&(start, end)) = offsets.get(idx) else {
            continue;
        };
        if start >= end {
            // Zero-width offset carries no text
            if let Some(span) = open.take() {
                entities.extend(span.into_entity(text, requested_type));
            }
            continue;
        }

        match parse_bio(label) {
            BioTag::Outside => {
                if let Some(span) = open.take() {
                    entities.extend(span.into_entity(text, requested_type));
                }
            }
            BioTag::Begin(stem) => {
                if let Some(span) = open.take() {
                    entities.extend(span.into_entity(text, requested_type));
                }
                open = Some(OpenSpan::new(stem, start, end, score));
            }
            BioTag::Inside(stem) => match open.as_mut() {
                Some(span) if span.stem == stem => span.extend(end, score),
                // Orphan continuation opens a new span (lenient IOB2)
                _ => {
                    if let Some(span) = open.take() {
                        entities.extend(span.into_entity(text, requested_type));
                    }
                    open = Some(OpenSpan::new(stem, start, end, score));
                }
            },
        }
    }

    if let Some(span) = open.take() {
        entities.extend(span.into_entity(text, requested_type));
    }

    entities
}
