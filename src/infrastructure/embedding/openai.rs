use std::time::Duration;

use async_trait::async_trait;
use rig::client::{EmbeddingsClient, ProviderClient};
use rig::embeddings::EmbeddingsBuilder;
use rig::providers::openai;

use crate::domain::{errors::EmbeddingError, ports::Embedder, Embedding};
use crate::infrastructure::config::EmbeddingConfig;

/// OpenAI embeddings through rig. Batches requests, narrows the returned
/// f64 vectors to f32, and verifies every vector against the configured
/// dimension before handing it back.
pub struct OpenAiEmbedder {
    client: openai::Client,
    model: String,
    dimension: usize,
    batch_size: usize,
    max_input_chars: usize,
    timeout: Duration,
}

impl OpenAiEmbedder {
    /// Reads `OPENAI_API_KEY` from the environment; the caller is expected
    /// to have checked it is set.
    pub fn from_env(config: &EmbeddingConfig) -> Self {
        Self {
            client: openai::Client::from_env(),
            model: config.model.clone(),
            dimension: config.dimension,
            batch_size: config.batch_size.max(1),
            max_input_chars: config.max_input_chars,
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    fn check_budget(&self, text: &str) -> Result<(), EmbeddingError> {
        let chars = text.chars().count();
        if chars > self.max_input_chars {
            return Err(EmbeddingError::InputTooLarge {
                chars,
                budget: self.max_input_chars,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        for text in texts {
            self.check_budget(text)?;
        }

        let mut embeddings = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            let model = self
                .client
                .embedding_model_with_ndims(&self.model, self.dimension);

            let mut builder = EmbeddingsBuilder::new(model);
            for text in batch {
                builder = builder
                    .document(*text)
                    .map_err(|e| EmbeddingError::Provider(e.to_string()))?;
            }

            let embedded = tokio::time::timeout(self.timeout, builder.build())
                .await
                .map_err(|_| EmbeddingError::Timeout {
                    seconds: self.timeout.as_secs(),
                })?
                .map_err(|e| EmbeddingError::Provider(e.to_string()))?;

            for (_doc, vectors) in embedded {
                let vector = Embedding::from(vectors.first().vec);
                if vector.dimension() != self.dimension {
                    return Err(EmbeddingError::DimensionMismatch {
                        expected: self.dimension,
                        actual: vector.dimension(),
                    });
                }
                embeddings.push(vector);
            }
        }

        if embeddings.len() != texts.len() {
            return Err(EmbeddingError::Provider(format!(
                "provider returned {} embeddings for {} inputs",
                embeddings.len(),
                texts.len()
            )));
        }

        Ok(embeddings)
    }

    async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let mut embeddings = self.embed_batch(&[text]).await?;
        embeddings
            .pop()
            .ok_or_else(|| EmbeddingError::Provider("no embedding returned".to_string()))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
