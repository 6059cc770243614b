mod chunk;
mod embedding;
mod stats;

pub use chunk::{
    ChunkMatch, ChunkRecord, MetadataMap, MetadataValue, StoredChunk, VectorId, RESERVED_KEYS,
};
pub use embedding::Embedding;
pub use stats::IndexStats;
