use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Payload keys owned by the store. Caller metadata colliding with one of
/// these is silently overridden when the payload is merged.
pub const RESERVED_KEYS: [&str; 4] = ["document_id", "chunk_index", "text", "chunk_size"];

/// Deterministic index id for one chunk: `{document_id}_chunk_{chunk_index}`.
///
/// The same (document, index) pair always maps to the same id, which is what
/// makes re-storing a document an overwrite and deletion targetable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VectorId(String);

impl VectorId {
    pub fn for_chunk(document_id: &str, chunk_index: usize) -> Self {
        Self(format!("{document_id}_chunk_{chunk_index}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for VectorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VectorId {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// Scalar metadata supplied by callers alongside a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl MetadataValue {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Bool(value) => serde_json::Value::Bool(*value),
            Self::Int(value) => serde_json::Value::from(*value),
            Self::Float(value) => serde_json::Value::from(*value),
            Self::Text(value) => serde_json::Value::String(value.clone()),
        }
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

pub type MetadataMap = BTreeMap<String, MetadataValue>;

/// One chunk ready for indexing: the reserved fields plus the caller's
/// extension metadata, kept apart until [`merged_payload`] flattens them.
///
/// [`merged_payload`]: ChunkRecord::merged_payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub document_id: String,
    pub chunk_index: usize,
    pub text: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra: MetadataMap,
}

impl ChunkRecord {
    pub fn new(document_id: impl Into<String>, chunk_index: usize, text: impl Into<String>) -> Self {
        Self {
            document_id: document_id.into(),
            chunk_index,
            text: text.into(),
            extra: MetadataMap::new(),
        }
    }

    pub fn with_extra(mut self, extra: MetadataMap) -> Self {
        self.extra = extra;
        self
    }

    pub fn vector_id(&self) -> VectorId {
        VectorId::for_chunk(&self.document_id, self.chunk_index)
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    /// Flattens the record into the payload stored next to its vector.
    /// Caller metadata goes in first, then the reserved fields, so a caller
    /// key named like a reserved one is overridden rather than trusted.
    pub fn merged_payload(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut payload = serde_json::Map::new();
        for (key, value) in &self.extra {
            payload.insert(key.clone(), value.to_json());
        }
        payload.insert("document_id".to_string(), self.document_id.clone().into());
        payload.insert("chunk_index".to_string(), self.chunk_index.into());
        payload.insert("text".to_string(), self.text.clone().into());
        payload.insert("chunk_size".to_string(), self.char_count().into());
        payload
    }
}

/// A chunk as read back from the index, in reconstruction order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredChunk {
    pub text: String,
    pub chunk_index: usize,
}

/// One semantic-search hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMatch {
    pub text: String,
    pub score: f32,
    pub document_id: String,
    pub chunk_index: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_id_format() {
        let id = VectorId::for_chunk("doc-42", 7);
        assert_eq!(id.as_str(), "doc-42_chunk_7");
        assert_eq!(id.to_string(), "doc-42_chunk_7");
    }

    #[test]
    fn test_vector_id_is_deterministic() {
        assert_eq!(
            VectorId::for_chunk("abc", 0),
            VectorId::for_chunk("abc", 0)
        );
        assert_ne!(
            VectorId::for_chunk("abc", 0),
            VectorId::for_chunk("abc", 1)
        );
    }

    #[test]
    fn test_merged_payload_contains_reserved_fields() {
        let record = ChunkRecord::new("doc-1", 3, "héllo");
        let payload = record.merged_payload();

        assert_eq!(payload["document_id"], "doc-1");
        assert_eq!(payload["chunk_index"], 3);
        assert_eq!(payload["text"], "héllo");
        assert_eq!(payload["chunk_size"], 5);
    }

    #[test]
    fn test_reserved_keys_win_over_caller_metadata() {
        let mut extra = MetadataMap::new();
        extra.insert("document_id".to_string(), MetadataValue::from("spoofed"));
        extra.insert("chunk_size".to_string(), MetadataValue::from(9999_i64));
        extra.insert("source".to_string(), MetadataValue::from("upload"));

        let record = ChunkRecord::new("doc-real", 0, "body").with_extra(extra);
        let payload = record.merged_payload();

        assert_eq!(payload["document_id"], "doc-real");
        assert_eq!(payload["chunk_size"], 4);
        assert_eq!(payload["source"], "upload");
    }

    #[test]
    fn test_metadata_value_json_shapes() {
        assert_eq!(MetadataValue::from(true).to_json(), serde_json::json!(true));
        assert_eq!(MetadataValue::from(3_i64).to_json(), serde_json::json!(3));
        assert_eq!(MetadataValue::from(2.5).to_json(), serde_json::json!(2.5));
        assert_eq!(
            MetadataValue::from("tag").to_json(),
            serde_json::json!("tag")
        );
    }

    #[test]
    fn test_metadata_value_untagged_roundtrip() {
        let parsed: MetadataMap =
            serde_json::from_str(r#"{"flag":true,"count":2,"ratio":0.5,"name":"x"}"#).unwrap();

        assert_eq!(parsed["flag"], MetadataValue::Bool(true));
        assert_eq!(parsed["count"], MetadataValue::Int(2));
        assert_eq!(parsed["ratio"], MetadataValue::Float(0.5));
        assert_eq!(parsed["name"], MetadataValue::Text("x".to_string()));
    }
}
