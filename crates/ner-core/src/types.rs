//! Shared data types for the NER service.

use serde::{Deserialize, Serialize};

/// An extracted entity span.
///
/// Offsets index the original input text. Produced per prediction call,
/// immutable, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// The extracted entity text
    pub text: String,
    /// Start offset in the original text
    pub start: usize,
    /// End offset in the original text (exclusive)
    pub end: usize,
    /// Type label of the extracted entity
    pub entity_type: String,
    /// Confidence score in [0, 1]
    pub score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_serializes_all_fields() {
        let entity = Entity {
            text: "Microsoft".to_string(),
            start: 10,
            end: 19,
            entity_type: "ORGANIZATION".to_string(),
            score: 0.95,
        };

        let json = serde_json::to_value(&entity).unwrap();
        assert_eq!(json["text"], "Microsoft");
        assert_eq!(json["start"], 10);
        assert_eq!(json["end"], 19);
        assert_eq!(json["entity_type"], "ORGANIZATION");
        assert!((json["score"].as_f64().unwrap() - 0.95).abs() < 1e-6);
    }
}
