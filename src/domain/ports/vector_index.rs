use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::{errors::VectorIndexError, Embedding, IndexStats, VectorId};

/// One vector plus its flat payload, ready to write.
#[derive(Debug, Clone)]
pub struct VectorRecord {
    pub id: VectorId,
    pub embedding: Embedding,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// A similarity hit, highest score first.
#[derive(Debug, Clone)]
pub struct IndexMatch {
    pub id: VectorId,
    pub score: f32,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// An enumerated point, no score attached.
#[derive(Debug, Clone)]
pub struct IndexEntry {
    pub id: VectorId,
    pub payload: serde_json::Map<String, serde_json::Value>,
}

/// Exact-match filter operand. Floats are deliberately absent; equality on
/// them is not a meaningful index filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterValue {
    Text(String),
    Int(i64),
    Bool(bool),
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// All entries must match for a point to qualify. Empty means unfiltered.
pub type MetadataFilter = BTreeMap<String, FilterValue>;

/// External vector index scoped to one collection.
///
/// Implementations own the collection lifecycle: constructing an adapter
/// creates the collection if absent and waits until it is ready.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Write-or-replace by id. The whole batch is validated against the
    /// index dimension before anything is written.
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorIndexError>;

    /// Up to `top_k` nearest neighbors under the index metric, restricted to
    /// points matching every filter entry. Descending score; ties keep the
    /// provider's native order.
    async fn query(
        &self,
        vector: &Embedding,
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, VectorIndexError>;

    /// Exhaustive enumeration of points matching the filter, paging until
    /// the provider reports no more. Not similarity-ordered.
    async fn list(&self, filter: &MetadataFilter) -> Result<Vec<IndexEntry>, VectorIndexError>;

    /// Removes exactly the given ids. Unknown ids are a no-op.
    async fn delete(&self, ids: &[VectorId]) -> Result<(), VectorIndexError>;

    async fn stats(&self) -> Result<IndexStats, VectorIndexError>;

    fn dimension(&self) -> usize;
}
