use std::sync::RwLock;

use async_trait::async_trait;

use crate::domain::{
    errors::VectorIndexError,
    ports::{FilterValue, IndexEntry, IndexMatch, MetadataFilter, VectorIndex, VectorRecord},
    Embedding, IndexStats, VectorId,
};

struct StoredPoint {
    id: VectorId,
    embedding: Embedding,
    payload: serde_json::Map<String, serde_json::Value>,
}

/// Index over a plain vec with brute-force cosine scoring. Backs tests and
/// doubles as the reference for the port's semantics: upsert replaces by id,
/// dimension checks reject the whole batch, filters are exact matches.
pub struct InMemoryVectorIndex {
    points: RwLock<Vec<StoredPoint>>,
    dimension: usize,
}

impl InMemoryVectorIndex {
    pub fn new(dimension: usize) -> Self {
        Self {
            points: RwLock::new(Vec::new()),
            dimension,
        }
    }
}

fn matches_filter(
    payload: &serde_json::Map<String, serde_json::Value>,
    filter: &MetadataFilter,
) -> bool {
    filter
        .iter()
        .all(|(field, expected)| match (payload.get(field), expected) {
            (Some(actual), FilterValue::Text(v)) => actual.as_str() == Some(v.as_str()),
            (Some(actual), FilterValue::Int(v)) => actual.as_i64() == Some(*v),
            (Some(actual), FilterValue::Bool(v)) => actual.as_bool() == Some(*v),
            (None, _) => false,
        })
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorIndexError> {
        for record in &records {
            if record.embedding.dimension() != self.dimension {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.embedding.dimension(),
                });
            }
        }

        let mut points = self
            .points
            .write()
            .map_err(|e| VectorIndexError::Write(e.to_string()))?;

        for record in records {
            points.retain(|p| p.id != record.id);
            points.push(StoredPoint {
                id: record.id,
                embedding: record.embedding,
                payload: record.payload,
            });
        }

        Ok(())
    }

    async fn query(
        &self,
        vector: &Embedding,
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, VectorIndexError> {
        let points = self
            .points
            .read()
            .map_err(|e| VectorIndexError::Query(e.to_string()))?;

        let mut matches: Vec<IndexMatch> = points
            .iter()
            .filter(|p| matches_filter(&p.payload, filter))
            .map(|p| IndexMatch {
                id: p.id.clone(),
                score: vector.cosine_similarity(&p.embedding),
                payload: p.payload.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        matches.truncate(top_k);

        Ok(matches)
    }

    async fn list(&self, filter: &MetadataFilter) -> Result<Vec<IndexEntry>, VectorIndexError> {
        let points = self
            .points
            .read()
            .map_err(|e| VectorIndexError::Query(e.to_string()))?;

        Ok(points
            .iter()
            .filter(|p| matches_filter(&p.payload, filter))
            .map(|p| IndexEntry {
                id: p.id.clone(),
                payload: p.payload.clone(),
            })
            .collect())
    }

    async fn delete(&self, ids: &[VectorId]) -> Result<(), VectorIndexError> {
        let mut points = self
            .points
            .write()
            .map_err(|e| VectorIndexError::Delete(e.to_string()))?;

        points.retain(|p| !ids.contains(&p.id));
        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, VectorIndexError> {
        let points = self
            .points
            .read()
            .map_err(|e| VectorIndexError::Query(e.to_string()))?;

        Ok(IndexStats {
            vectors: points.len() as u64,
            segments: 1,
            dimension: self.dimension,
            status: "green".to_string(),
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
