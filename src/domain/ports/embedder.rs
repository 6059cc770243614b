use async_trait::async_trait;

use crate::domain::{errors::EmbeddingError, Embedding};

/// Fixed-dimension text embedding. `embed_batch` output is position-aligned
/// with its input; internal batching is not observable to callers.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError>;
    async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError>;
    fn dimension(&self) -> usize;
}
