use thiserror::Error;

/// Chunker construction failures. Chunking itself is total over any string,
/// so nothing here is raised on the hot path.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("chunk_size must be at least 1")]
    ChunkSizeZero,
}

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding provider error: {0}")]
    Provider(String),

    #[error("embedding request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding input of {chars} chars exceeds the {budget}-char budget")]
    InputTooLarge { chars: usize, budget: usize },
}

#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("index provisioning failed: {0}")]
    Provisioning(String),

    #[error("vector dimension mismatch: index expects {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("index write failed: {0}")]
    Write(String),

    #[error("index query failed: {0}")]
    Query(String),

    #[error("index delete failed: {0}")]
    Delete(String),
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("completion provider error: {0}")]
    Provider(String),

    #[error("completion timed out after {seconds}s")]
    Timeout { seconds: u64 },
}

/// What went wrong underneath a document-store operation. Chunking is not
/// represented: splitting is total once a [`Chunker`](crate::domain::Chunker)
/// exists, so only the provider stages can fail.
#[derive(Debug, Error)]
pub enum StoreCause {
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),

    #[error(transparent)]
    Index(#[from] VectorIndexError),
}

/// Document-store failure tagged with the operation and document it
/// interrupted, so callers can map it to a transport status without parsing
/// provider messages.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("store of document '{document_id}' failed: {source}")]
    Store {
        document_id: String,
        #[source]
        source: StoreCause,
    },

    #[error("search failed: {source}")]
    Search {
        #[source]
        source: StoreCause,
    },

    #[error("chunk listing for document '{document_id}' failed: {source}")]
    ListChunks {
        document_id: String,
        #[source]
        source: StoreCause,
    },

    #[error("delete of document '{document_id}' failed: {source}")]
    Delete {
        document_id: String,
        #[source]
        source: StoreCause,
    },

    #[error("index stats unavailable: {source}")]
    Stats {
        #[source]
        source: StoreCause,
    },
}

impl VectorStoreError {
    pub fn cause(&self) -> &StoreCause {
        match self {
            Self::Store { source, .. }
            | Self::Search { source }
            | Self::ListChunks { source, .. }
            | Self::Delete { source, .. }
            | Self::Stats { source } => source,
        }
    }
}

/// Assistant failures that actually abort a request. Retrieval and indexing
/// problems degrade inside the service instead of surfacing here.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error(transparent)]
    Llm(#[from] LlmError),
}
