use std::sync::Arc;

use tracing::instrument;

use crate::domain::{
    errors::{StoreCause, VectorStoreError},
    ports::{Embedder, FilterValue, IndexEntry, IndexMatch, MetadataFilter, VectorIndex, VectorRecord},
    text::truncate_chars,
    ChunkMatch, ChunkRecord, Chunker, IndexStats, MetadataMap, StoredChunk, VectorId,
};

/// Chunk, embed, and index documents; the write and read paths share one
/// index and one embedding space. Storing the same document twice rewrites
/// its points in place because chunk ids are derived, not generated.
pub struct DocumentVectorStore {
    chunker: Chunker,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    embed_max_chars: usize,
}

/// What `store` did. `Empty` means the text chunked to nothing and the index
/// was not touched; callers decide whether that is an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Empty,
    Indexed { chunks: usize },
}

fn document_filter(document_id: Option<&str>) -> MetadataFilter {
    let mut filter = MetadataFilter::new();
    if let Some(id) = document_id {
        filter.insert("document_id".to_string(), FilterValue::from(id));
    }
    filter
}

fn payload_str(payload: &serde_json::Map<String, serde_json::Value>, field: &str) -> String {
    payload
        .get(field)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

fn payload_index(payload: &serde_json::Map<String, serde_json::Value>) -> usize {
    payload
        .get("chunk_index")
        .and_then(|v| v.as_u64())
        .unwrap_or_default() as usize
}

fn to_chunk_match(hit: IndexMatch) -> ChunkMatch {
    ChunkMatch {
        text: payload_str(&hit.payload, "text"),
        score: hit.score,
        document_id: payload_str(&hit.payload, "document_id"),
        chunk_index: payload_index(&hit.payload),
    }
}

fn to_stored_chunk(entry: IndexEntry) -> StoredChunk {
    StoredChunk {
        text: payload_str(&entry.payload, "text"),
        chunk_index: payload_index(&entry.payload),
    }
}

impl DocumentVectorStore {
    pub fn new(
        chunker: Chunker,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        embed_max_chars: usize,
    ) -> Self {
        Self {
            chunker,
            embedder,
            index,
            embed_max_chars,
        }
    }

    /// Splits `text`, embeds every chunk, and writes the batch in one upsert.
    /// The payload keeps the full chunk text; only the embedder input is cut
    /// to the character budget. Any failure leaves the index unwritten.
    #[instrument(skip(self, text, extra), fields(chars = text.chars().count()))]
    pub async fn store(
        &self,
        document_id: &str,
        text: &str,
        extra: MetadataMap,
    ) -> Result<StoreOutcome, VectorStoreError> {
        let store_error = |source: StoreCause| VectorStoreError::Store {
            document_id: document_id.to_string(),
            source,
        };

        let chunks = self.chunker.chunk(text);
        if chunks.is_empty() {
            return Ok(StoreOutcome::Empty);
        }

        let inputs: Vec<_> = chunks
            .iter()
            .map(|c| truncate_chars(c, self.embed_max_chars))
            .collect();
        let texts: Vec<&str> = inputs.iter().map(|c| c.as_ref()).collect();
        let embeddings = self
            .embedder
            .embed_batch(&texts)
            .await
            .map_err(|e| store_error(e.into()))?;

        let records: Vec<VectorRecord> = chunks
            .into_iter()
            .zip(embeddings)
            .enumerate()
            .map(|(chunk_index, (chunk_text, embedding))| {
                let chunk =
                    ChunkRecord::new(document_id, chunk_index, chunk_text).with_extra(extra.clone());
                VectorRecord {
                    id: chunk.vector_id(),
                    embedding,
                    payload: chunk.merged_payload(),
                }
            })
            .collect();
        let stored = records.len();

        self.index
            .upsert(records)
            .await
            .map_err(|e| store_error(e.into()))?;

        Ok(StoreOutcome::Indexed { chunks: stored })
    }

    /// Nearest chunks to `query`, optionally restricted to one document.
    #[instrument(skip(self, query))]
    pub async fn search(
        &self,
        query: &str,
        document_id: Option<&str>,
        top_k: usize,
    ) -> Result<Vec<ChunkMatch>, VectorStoreError> {
        let search_error = |source: StoreCause| VectorStoreError::Search { source };

        let input = truncate_chars(query, self.embed_max_chars);
        let embedding = self
            .embedder
            .embed_one(input.as_ref())
            .await
            .map_err(|e| search_error(e.into()))?;

        let hits = self
            .index
            .query(&embedding, &document_filter(document_id), top_k)
            .await
            .map_err(|e| search_error(e.into()))?;

        Ok(hits.into_iter().map(to_chunk_match).collect())
    }

    /// Every stored chunk of a document in ascending chunk order. The index
    /// enumerates in its own order, so the sort here is load-bearing.
    #[instrument(skip(self))]
    pub async fn list_chunks(
        &self,
        document_id: &str,
    ) -> Result<Vec<StoredChunk>, VectorStoreError> {
        let entries = self
            .index
            .list(&document_filter(Some(document_id)))
            .await
            .map_err(|e| VectorStoreError::ListChunks {
                document_id: document_id.to_string(),
                source: e.into(),
            })?;

        let mut chunks: Vec<StoredChunk> = entries.into_iter().map(to_stored_chunk).collect();
        chunks.sort_by_key(|c| c.chunk_index);
        Ok(chunks)
    }

    /// Removes every point of the document and reports how many there were.
    /// A document that was never stored deletes zero chunks successfully.
    #[instrument(skip(self))]
    pub async fn delete(&self, document_id: &str) -> Result<usize, VectorStoreError> {
        let delete_error = |source: StoreCause| VectorStoreError::Delete {
            document_id: document_id.to_string(),
            source,
        };

        let entries = self
            .index
            .list(&document_filter(Some(document_id)))
            .await
            .map_err(|e| delete_error(e.into()))?;
        if entries.is_empty() {
            return Ok(0);
        }

        let ids: Vec<VectorId> = entries.into_iter().map(|e| e.id).collect();
        self.index
            .delete(&ids)
            .await
            .map_err(|e| delete_error(e.into()))?;

        Ok(ids.len())
    }

    #[instrument(skip(self))]
    pub async fn stats(&self) -> Result<IndexStats, VectorStoreError> {
        self.index
            .stats()
            .await
            .map_err(|e| VectorStoreError::Stats { source: e.into() })
    }
}
