//! Vector records sent to the hosted index.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::embedder::EmbeddingPair;

/// Metadata stored next to each vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    /// Chunk text the vector was computed from.
    pub text: String,
    /// Origin tag, e.g. `mlb-chicago-cubs`.
    pub source: String,
}

/// One `(id, values, metadata)` triple in Pinecone's upsert shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    /// Random identifier.
    pub id: String,
    /// Embedding values.
    pub values: Vec<f32>,
    /// Attached metadata.
    pub metadata: RecordMetadata,
}

impl VectorRecord {
    /// Wraps an embedding pair with a fresh UUID v4 identifier.
    pub fn from_pair(pair: EmbeddingPair, source: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            values: pair.vector,
            metadata: RecordMetadata {
                text: pair.text,
                source: source.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn serializes_in_upsert_shape() {
        let record = VectorRecord::from_pair(
            EmbeddingPair {
                text: "Wrigley Field opened in 1914.".to_string(),
                vector: vec![0.5, 0.25],
            },
            "mlb-chicago-cubs",
        );
        let json = serde_json::to_value(&record).expect("serialize");
        assert_eq!(json["values"], serde_json::json!([0.5, 0.25]));
        assert_eq!(json["metadata"]["text"], "Wrigley Field opened in 1914.");
        assert_eq!(json["metadata"]["source"], "mlb-chicago-cubs");
        assert!(Uuid::parse_str(json["id"].as_str().expect("id")).is_ok());
    }

    #[test]
    fn identifiers_are_unique() {
        let ids: HashSet<String> = (0..500)
            .map(|i| {
                VectorRecord::from_pair(
                    EmbeddingPair {
                        text: format!("chunk {i}"),
                        vector: vec![0.0],
                    },
                    "test",
                )
                .id
            })
            .collect();
        assert_eq!(ids.len(), 500);
    }
}
