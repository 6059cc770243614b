mod embedder;
mod llm;
mod vector_index;

pub use embedder::Embedder;
pub use llm::LlmService;
pub use vector_index::{
    FilterValue, IndexEntry, IndexMatch, MetadataFilter, VectorIndex, VectorRecord,
};
