use serde::{Deserialize, Serialize};

/// Point-in-time snapshot of the vector index. No consistency guarantee
/// relative to writes in flight.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexStats {
    /// Number of stored vectors.
    pub vectors: u64,
    /// Provider-side storage segments backing the collection.
    pub segments: u64,
    /// Configured vector width.
    pub dimension: usize,
    /// Provider-reported health, e.g. "green".
    pub status: String,
}
