use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::{
    CollectionStatus, Condition, CreateCollectionBuilder, DeletePoints, DeletePointsBuilder,
    Distance, Filter, PointStruct, PointsIdsList, ScrollPoints, ScrollPointsBuilder, SearchPoints,
    SearchPointsBuilder, UpsertPoints, UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant, QdrantError};
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    errors::VectorIndexError,
    ports::{FilterValue, IndexEntry, IndexMatch, MetadataFilter, VectorIndex, VectorRecord},
    Embedding, IndexStats, VectorId,
};
use crate::infrastructure::config::VectorConfig;

const SCROLL_PAGE: u32 = 256;
const READY_POLL_ATTEMPTS: u32 = 25;
const READY_POLL_INTERVAL: Duration = Duration::from_millis(200);

/// gRPC codes worth retrying: DeadlineExceeded, ResourceExhausted, Aborted,
/// Unavailable.
const RETRYABLE_CODES: [i32; 4] = [4, 8, 10, 14];

/// Qdrant-backed vector index over a single collection.
///
/// Construction creates the collection when absent and waits until it
/// reports green. Point ids are UUIDv5 digests of the deterministic chunk
/// id string, so the same chunk always maps to the same point; the original
/// id is reconstructed from the reserved payload fields on the way out.
pub struct QdrantVectorIndex {
    client: Qdrant,
    collection: String,
    dimension: usize,
    max_retries: u32,
    retry_backoff: Duration,
}

impl QdrantVectorIndex {
    pub async fn connect(
        url: &str,
        config: &VectorConfig,
        dimension: usize,
    ) -> Result<Self, VectorIndexError> {
        let mut builder =
            Qdrant::from_url(url).timeout(Duration::from_secs(config.timeout_seconds));
        if let Some(api_key) = &config.api_key {
            builder = builder.api_key(api_key.clone());
        }
        let client = builder
            .build()
            .map_err(|e| VectorIndexError::Provisioning(e.to_string()))?;

        let index = Self {
            client,
            collection: config.collection.clone(),
            dimension,
            max_retries: config.max_retries,
            retry_backoff: Duration::from_millis(config.retry_backoff_ms),
        };

        index.ensure_collection().await?;

        Ok(index)
    }

    async fn ensure_collection(&self) -> Result<(), VectorIndexError> {
        let collections = self
            .client
            .list_collections()
            .await
            .map_err(|e| VectorIndexError::Provisioning(e.to_string()))?;

        let exists = collections
            .collections
            .iter()
            .any(|c| c.name == self.collection);

        if !exists {
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(self.dimension as u64, Distance::Cosine),
                    ),
                )
                .await
                .map_err(|e| VectorIndexError::Provisioning(e.to_string()))?;
            info!(collection = %self.collection, dimension = self.dimension, "collection created");
        }

        self.wait_until_ready().await
    }

    async fn wait_until_ready(&self) -> Result<(), VectorIndexError> {
        for _ in 0..READY_POLL_ATTEMPTS {
            let info = self
                .client
                .collection_info(&self.collection)
                .await
                .map_err(|e| VectorIndexError::Provisioning(e.to_string()))?;

            let status = info
                .result
                .map(|r| r.status)
                .and_then(|s| CollectionStatus::try_from(s).ok());
            if status == Some(CollectionStatus::Green) {
                return Ok(());
            }

            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        Err(VectorIndexError::Provisioning(format!(
            "collection '{}' did not become ready",
            self.collection
        )))
    }

    async fn with_retry<T, F, Fut>(&self, call: F) -> Result<T, QdrantError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, QdrantError>>,
    {
        let mut attempt = 0u32;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_retries && is_transient(&err) => {
                    attempt += 1;
                    let backoff = self.retry_backoff * (1 << (attempt - 1));
                    warn!(attempt, error = %err, "transient index error, backing off");
                    tokio::time::sleep(backoff).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

fn is_transient(err: &QdrantError) -> bool {
    match err {
        QdrantError::ResponseError { status } => {
            RETRYABLE_CODES.contains(&(status.code() as i32))
        }
        QdrantError::Io(_) => true,
        _ => false,
    }
}

fn point_uuid(id: &VectorId) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_str().as_bytes())
}

fn build_filter(filter: &MetadataFilter) -> Filter {
    Filter::must(filter.iter().map(|(field, value)| match value {
        FilterValue::Text(v) => Condition::matches(field.clone(), v.clone()),
        FilterValue::Int(v) => Condition::matches(field.clone(), *v),
        FilterValue::Bool(v) => Condition::matches(field.clone(), *v),
    }))
}

fn value_to_json(value: &Value) -> serde_json::Value {
    if let Some(flag) = value.as_bool() {
        serde_json::Value::Bool(flag)
    } else if let Some(number) = value.as_integer() {
        number.into()
    } else if let Some(number) = value.as_double() {
        number.into()
    } else if let Some(text) = value.as_str() {
        text.to_string().into()
    } else {
        serde_json::Value::Null
    }
}

fn payload_to_json(
    payload: &HashMap<String, Value>,
) -> serde_json::Map<String, serde_json::Value> {
    payload
        .iter()
        .map(|(key, value)| (key.clone(), value_to_json(value)))
        .collect()
}

/// The reserved payload fields name the owning chunk exactly, which is how
/// the string id round-trips through Qdrant's uuid-only point ids.
fn reconstruct_id(payload: &serde_json::Map<String, serde_json::Value>) -> Option<VectorId> {
    let document_id = payload.get("document_id")?.as_str()?;
    let chunk_index = payload.get("chunk_index")?.as_u64()? as usize;
    Some(VectorId::for_chunk(document_id, chunk_index))
}

#[async_trait]
impl VectorIndex for QdrantVectorIndex {
    async fn upsert(&self, records: Vec<VectorRecord>) -> Result<(), VectorIndexError> {
        if records.is_empty() {
            return Ok(());
        }
        for record in &records {
            if record.embedding.dimension() != self.dimension {
                return Err(VectorIndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: record.embedding.dimension(),
                });
            }
        }

        let mut points = Vec::with_capacity(records.len());
        for record in records {
            let payload: Payload = serde_json::Value::Object(record.payload)
                .try_into()
                .map_err(|_| VectorIndexError::Write("payload is not a JSON object".into()))?;
            points.push(PointStruct::new(
                point_uuid(&record.id).to_string(),
                record.embedding.into_inner(),
                payload,
            ));
        }

        let request: UpsertPoints = UpsertPointsBuilder::new(&self.collection, points)
            .wait(true)
            .into();

        self.with_retry(|| self.client.upsert_points(request.clone()))
            .await
            .map_err(|e| VectorIndexError::Write(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        vector: &Embedding,
        filter: &MetadataFilter,
        top_k: usize,
    ) -> Result<Vec<IndexMatch>, VectorIndexError> {
        let mut builder = SearchPointsBuilder::new(
            &self.collection,
            vector.as_slice().to_vec(),
            top_k as u64,
        )
        .with_payload(true);
        if !filter.is_empty() {
            builder = builder.filter(build_filter(filter));
        }
        let request: SearchPoints = builder.into();

        let response = self
            .with_retry(|| self.client.search_points(request.clone()))
            .await
            .map_err(|e| VectorIndexError::Query(e.to_string()))?;

        Ok(response
            .result
            .into_iter()
            .filter_map(|point| {
                let payload = payload_to_json(&point.payload);
                let id = reconstruct_id(&payload)?;
                Some(IndexMatch {
                    id,
                    score: point.score,
                    payload,
                })
            })
            .collect())
    }

    async fn list(&self, filter: &MetadataFilter) -> Result<Vec<IndexEntry>, VectorIndexError> {
        let mut entries = Vec::new();
        let mut offset = None;

        loop {
            let mut builder = ScrollPointsBuilder::new(&self.collection)
                .limit(SCROLL_PAGE)
                .with_payload(true);
            if !filter.is_empty() {
                builder = builder.filter(build_filter(filter));
            }
            if let Some(offset) = offset.take() {
                builder = builder.offset(offset);
            }
            let request: ScrollPoints = builder.into();

            let response = self
                .with_retry(|| self.client.scroll(request.clone()))
                .await
                .map_err(|e| VectorIndexError::Query(e.to_string()))?;

            entries.extend(response.result.into_iter().filter_map(|point| {
                let payload = payload_to_json(&point.payload);
                let id = reconstruct_id(&payload)?;
                Some(IndexEntry { id, payload })
            }));

            match response.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(entries)
    }

    async fn delete(&self, ids: &[VectorId]) -> Result<(), VectorIndexError> {
        if ids.is_empty() {
            return Ok(());
        }

        let points = PointsIdsList {
            ids: ids
                .iter()
                .map(|id| point_uuid(id).to_string().into())
                .collect(),
        };
        let request: DeletePoints = DeletePointsBuilder::new(&self.collection)
            .points(points)
            .wait(true)
            .into();

        self.with_retry(|| self.client.delete_points(request.clone()))
            .await
            .map_err(|e| VectorIndexError::Delete(e.to_string()))?;

        Ok(())
    }

    async fn stats(&self) -> Result<IndexStats, VectorIndexError> {
        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| VectorIndexError::Query(e.to_string()))?
            .result
            .ok_or_else(|| VectorIndexError::Query("empty collection info".into()))?;

        let status = match CollectionStatus::try_from(info.status) {
            Ok(CollectionStatus::Green) => "green",
            Ok(CollectionStatus::Yellow) => "yellow",
            Ok(CollectionStatus::Red) => "red",
            Ok(CollectionStatus::Grey) => "grey",
            _ => "unknown",
        };

        Ok(IndexStats {
            vectors: info.points_count.unwrap_or(0),
            segments: info.segments_count,
            dimension: self.dimension,
            status: status.to_string(),
        })
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
