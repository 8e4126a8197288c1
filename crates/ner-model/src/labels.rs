//! Label vocabulary and BIO tag parsing.

use std::collections::HashMap;

use crate::error::{ModelError, ModelResult};

/// Dense label vocabulary built from a checkpoint's `id2label` map.
#[derive(Debug, Clone)]
pub struct LabelMap {
    labels: Vec<String>,
}

impl LabelMap {
    /// Build from the raw `id2label` object (stringified indices as keys).
    ///
    /// Indices must form a dense `0..n` range; anything else is a config
    /// error in the checkpoint.
    pub fn from_id2label(raw: &HashMap<String, String>) -> ModelResult<Self> {
        if raw.is_empty() {
            return Err(ModelError::ConfigError {
                message: "id2label is empty".to_string(),
            });
        }

        let mut labels = vec![None; raw.len()];
        for (key, label) in raw {
            let idx: usize = key.parse().map_err(|_| ModelError::ConfigError {
                message: format!("id2label key '{}' is not an integer", key),
            })?;
            if idx >= labels.len() {
                return Err(ModelError::ConfigError {
                    message: format!(
                        "id2label indices are not dense: index {} with {} labels",
                        idx,
                        raw.len()
                    ),
                });
            }
            labels[idx] = Some(label.clone());
        }

        let labels = labels
            .into_iter()
            .collect::<Option<Vec<_>>>()
            .ok_or_else(|| ModelError::ConfigError {
                message: "id2label indices are not dense".to_string(),
            })?;

        Ok(Self { labels })
    }

    /// Label string for a class id.
    pub fn get(&self, id: usize) -> Option<&str> {
        self.labels.get(id).map(String::as_str)
    }

    /// Number of classes.
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A parsed BIO tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BioTag<'a> {
    /// `O`: token is outside any entity
    Outside,
    /// `B-X`: token begins an entity of type X
    Begin(&'a str),
    /// `I-X`: token continues an entity of type X
    Inside(&'a str),
}

/// Parse a label into its BIO tag.
///
/// Bare labels without a `B-`/`I-` prefix (non-BIO label sets) act like
/// `I-<label>` so consecutive same-label tokens merge into one span.
pub fn parse_bio(label: &str) -> BioTag<'_> {
    if label == "O" {
        BioTag::Outside
    } else if let Some(stem) = label.strip_prefix("B-") {
        BioTag::Begin(stem)
    } else if let Some(stem) = label.strip_prefix("I-") {
        BioTag::Inside(stem)
    } else {
        BioTag::Inside(label)
    }
}

/// Stems that mark an open-vocabulary checkpoint; decoded spans with a
/// generic stem inherit the requested entity type.
pub fn is_generic_stem(stem: &str) -> bool {
    stem.eq_ignore_ascii_case("ENT") || stem.eq_ignore_ascii_case("ENTITY")
}
