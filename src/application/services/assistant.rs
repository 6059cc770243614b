use std::sync::Arc;

use tracing::{instrument, warn};

use crate::application::services::{DocumentVectorStore, StoreOutcome};
use crate::domain::{
    errors::AssistantError, ports::LlmService, text::truncate_chars, MetadataMap,
};
use crate::infrastructure::config::{AssistantConfig, PromptsConfig};

/// Document Q&A on top of the vector store: summarize on upload, answer with
/// retrieved context. Runs without a vector backend too, falling back to
/// whatever text the caller supplies.
pub struct AssistantService {
    llm: Arc<dyn LlmService>,
    vector_store: Option<Arc<DocumentVectorStore>>,
    prompts: PromptsConfig,
    options: AssistantConfig,
}

/// Result of a summarize-on-upload. `indexed_chunks` is `None` when no
/// vector backend is configured or indexing failed; the summary itself never
/// depends on it.
#[derive(Debug, Clone)]
pub struct SummaryOutcome {
    pub summary: String,
    pub indexed_chunks: Option<usize>,
}

impl AssistantService {
    pub fn new(
        llm: Arc<dyn LlmService>,
        vector_store: Option<Arc<DocumentVectorStore>>,
        prompts: PromptsConfig,
        options: AssistantConfig,
    ) -> Self {
        Self {
            llm,
            vector_store,
            prompts,
            options,
        }
    }

    pub fn has_vector_store(&self) -> bool {
        self.vector_store.is_some()
    }

    /// Indexes the document, then summarizes it. Indexing is best-effort: a
    /// store failure is logged and the summary still goes out, just without
    /// chunks behind it.
    #[instrument(skip(self, text), fields(chars = text.chars().count()))]
    pub async fn summarize_document(
        &self,
        document_id: &str,
        filename: &str,
        text: &str,
    ) -> Result<SummaryOutcome, AssistantError> {
        let indexed_chunks = match &self.vector_store {
            Some(store) => {
                let mut extra = MetadataMap::new();
                extra.insert("document_type".to_string(), "uploaded".into());
                extra.insert("summary_generated".to_string(), true.into());

                match store.store(document_id, text, extra).await {
                    Ok(StoreOutcome::Indexed { chunks }) => Some(chunks),
                    Ok(StoreOutcome::Empty) => Some(0),
                    Err(error) => {
                        warn!(%error, document_id, "indexing failed, continuing unindexed");
                        None
                    }
                }
            }
            None => None,
        };

        let document = truncate_chars(text, self.options.summary_max_chars);
        let prompt = self
            .prompts
            .summary_user
            .replace("{document}", document.as_ref());
        let summary = self
            .llm
            .complete_with_system(&self.prompts.summary_system, &prompt)
            .await?;

        Ok(SummaryOutcome {
            summary,
            indexed_chunks,
        })
    }

    /// Answers a question from retrieved chunks when a document id is given,
    /// from `fallback_text` otherwise. With no usable context at all the
    /// configured no-context message is returned and the model is never
    /// called.
    #[instrument(skip(self, question, fallback_text))]
    pub async fn answer(
        &self,
        question: &str,
        document_id: Option<&str>,
        fallback_text: Option<&str>,
    ) -> Result<String, AssistantError> {
        let mut context = String::new();

        if let (Some(store), Some(id)) = (&self.vector_store, document_id) {
            match store.search(question, Some(id), self.options.answer_top_k).await {
                Ok(hits) if !hits.is_empty() => {
                    let texts: Vec<&str> = hits.iter().map(|h| h.text.as_str()).collect();
                    context = texts.join("\n\n");
                }
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, document_id = id, "retrieval failed, using fallback text");
                }
            }
        }

        if context.is_empty() {
            if let Some(fallback) = fallback_text {
                context = fallback.to_string();
            }
        }

        if context.trim().is_empty() {
            return Ok(self.prompts.no_context_message.clone());
        }

        let context = truncate_chars(&context, self.options.context_max_chars);
        let prompt = self
            .prompts
            .answer_user
            .replace("{question}", question)
            .replace("{context}", context.as_ref());

        Ok(self
            .llm
            .complete_with_system(&self.prompts.answer_system, &prompt)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        errors::{EmbeddingError, LlmError, VectorIndexError},
        ports::{Embedder, IndexEntry, IndexMatch, MetadataFilter, VectorIndex, VectorRecord},
        Chunker, Embedding, IndexStats, VectorId,
    };
    use crate::infrastructure::InMemoryVectorIndex;
    use async_trait::async_trait;
    use std::sync::Mutex;

    const DIMENSION: usize = 4;

    fn hash_embedding(text: &str) -> Embedding {
        let mut values = vec![0.0f32; DIMENSION];
        for (i, b) in text.bytes().enumerate() {
            values[i % DIMENSION] += b as f32;
        }
        Embedding::new(values)
    }

    struct HashEmbedder;

    #[async_trait]
    impl Embedder for HashEmbedder {
        async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>, EmbeddingError> {
            Ok(texts.iter().map(|t| hash_embedding(t)).collect())
        }

        async fn embed_one(&self, text: &str) -> Result<Embedding, EmbeddingError> {
            Ok(hash_embedding(text))
        }

        fn dimension(&self) -> usize {
            DIMENSION
        }
    }

    struct FakeLlm {
        calls: Mutex<Vec<(String, String)>>,
        reply: &'static str,
    }

    impl FakeLlm {
        fn new(reply: &'static str) -> Arc<Self> {
            Arc::new(Self {
                calls: Mutex::new(Vec::new()),
                reply,
            })
        }

        fn calls(&self) -> Vec<(String, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmService for FakeLlm {
        async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((String::new(), prompt.to_string()));
            Ok(self.reply.to_string())
        }

        async fn complete_with_system(
            &self,
            system: &str,
            prompt: &str,
        ) -> Result<String, LlmError> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), prompt.to_string()));
            Ok(self.reply.to_string())
        }
    }

    /// Index whose every operation fails, for exercising degraded paths.
    struct BrokenIndex;

    #[async_trait]
    impl VectorIndex for BrokenIndex {
        async fn upsert(&self, _records: Vec<VectorRecord>) -> Result<(), VectorIndexError> {
            Err(VectorIndexError::Write("index offline".into()))
        }

        async fn query(
            &self,
            _vector: &Embedding,
            _filter: &MetadataFilter,
            _top_k: usize,
        ) -> Result<Vec<IndexMatch>, VectorIndexError> {
            Err(VectorIndexError::Query("index offline".into()))
        }

        async fn list(
            &self,
            _filter: &MetadataFilter,
        ) -> Result<Vec<IndexEntry>, VectorIndexError> {
            Err(VectorIndexError::Query("index offline".into()))
        }

        async fn delete(&self, _ids: &[VectorId]) -> Result<(), VectorIndexError> {
            Err(VectorIndexError::Delete("index offline".into()))
        }

        async fn stats(&self) -> Result<IndexStats, VectorIndexError> {
            Err(VectorIndexError::Query("index offline".into()))
        }

        fn dimension(&self) -> usize {
            DIMENSION
        }
    }

    fn options() -> AssistantConfig {
        AssistantConfig {
            answer_top_k: 3,
            search_top_k: 5,
            context_max_chars: 4000,
            summary_max_chars: 4000,
        }
    }

    fn document_store(index: Arc<dyn VectorIndex>) -> Arc<DocumentVectorStore> {
        Arc::new(DocumentVectorStore::new(
            Chunker::default(),
            Arc::new(HashEmbedder),
            index,
            8000,
        ))
    }

    #[tokio::test]
    async fn test_answer_without_any_context_skips_the_model() {
        let llm = FakeLlm::new("never used");
        let assistant =
            AssistantService::new(llm.clone(), None, PromptsConfig::default(), options());

        let answer = assistant.answer("What is this?", None, None).await.unwrap();

        assert_eq!(answer, PromptsConfig::default().no_context_message);
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_answer_uses_fallback_text_without_store() {
        let llm = FakeLlm::new("the sky is blue");
        let assistant =
            AssistantService::new(llm.clone(), None, PromptsConfig::default(), options());

        let answer = assistant
            .answer("What color is the sky?", None, Some("The sky is blue."))
            .await
            .unwrap();

        assert_eq!(answer, "the sky is blue");
        let calls = llm.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1.contains("The sky is blue."));
        assert!(calls[0].1.contains("What color is the sky?"));
    }

    #[tokio::test]
    async fn test_answer_prefers_retrieved_chunks_over_fallback() {
        let store = document_store(Arc::new(InMemoryVectorIndex::new(DIMENSION)));
        store
            .store("doc-1", "Rust ships without a runtime.", MetadataMap::new())
            .await
            .unwrap();
        let llm = FakeLlm::new("from the index");
        let assistant = AssistantService::new(
            llm.clone(),
            Some(store),
            PromptsConfig::default(),
            options(),
        );

        let answer = assistant
            .answer("Does Rust have a runtime?", Some("doc-1"), Some("fallback body"))
            .await
            .unwrap();

        assert_eq!(answer, "from the index");
        let calls = llm.calls();
        assert!(calls[0].1.contains("Rust ships without a runtime."));
        assert!(!calls[0].1.contains("fallback body"));
    }

    #[tokio::test]
    async fn test_answer_falls_back_when_document_has_no_chunks() {
        let store = document_store(Arc::new(InMemoryVectorIndex::new(DIMENSION)));
        store
            .store("doc-1", "Only this document exists.", MetadataMap::new())
            .await
            .unwrap();
        let llm = FakeLlm::new("used the fallback");
        let assistant = AssistantService::new(
            llm.clone(),
            Some(store),
            PromptsConfig::default(),
            options(),
        );

        let answer = assistant
            .answer("Anything?", Some("doc-unknown"), Some("fallback body"))
            .await
            .unwrap();

        assert_eq!(answer, "used the fallback");
        assert!(llm.calls()[0].1.contains("fallback body"));
    }

    #[tokio::test]
    async fn test_answer_without_document_id_never_queries_the_index() {
        // BrokenIndex would error on any query; no id means no retrieval.
        let store = document_store(Arc::new(BrokenIndex));
        let llm = FakeLlm::new("unused");
        let assistant = AssistantService::new(
            llm.clone(),
            Some(store),
            PromptsConfig::default(),
            options(),
        );

        let answer = assistant.answer("Anything?", None, None).await.unwrap();

        assert_eq!(answer, PromptsConfig::default().no_context_message);
        assert!(llm.calls().is_empty());
    }

    #[tokio::test]
    async fn test_answer_survives_retrieval_failure() {
        let store = document_store(Arc::new(BrokenIndex));
        let llm = FakeLlm::new("still answered");
        let assistant = AssistantService::new(
            llm.clone(),
            Some(store),
            PromptsConfig::default(),
            options(),
        );

        let answer = assistant
            .answer("Anything?", Some("doc-1"), Some("fallback body"))
            .await
            .unwrap();

        assert_eq!(answer, "still answered");
        assert!(llm.calls()[0].1.contains("fallback body"));
    }

    #[tokio::test]
    async fn test_summarize_indexes_then_summarizes() {
        let store = document_store(Arc::new(InMemoryVectorIndex::new(DIMENSION)));
        let llm = FakeLlm::new("a fine summary");
        let assistant = AssistantService::new(
            llm.clone(),
            Some(store.clone()),
            PromptsConfig::default(),
            options(),
        );

        let outcome = assistant
            .summarize_document("doc-1", "notes.txt", "Some document body.")
            .await
            .unwrap();

        assert_eq!(outcome.summary, "a fine summary");
        assert_eq!(outcome.indexed_chunks, Some(1));
        assert_eq!(store.list_chunks("doc-1").await.unwrap().len(), 1);
        assert!(llm.calls()[0].1.contains("Some document body."));
    }

    #[tokio::test]
    async fn test_summarize_without_store_reports_no_chunks() {
        let llm = FakeLlm::new("summary anyway");
        let assistant =
            AssistantService::new(llm.clone(), None, PromptsConfig::default(), options());

        let outcome = assistant
            .summarize_document("doc-1", "notes.txt", "Some document body.")
            .await
            .unwrap();

        assert_eq!(outcome.summary, "summary anyway");
        assert_eq!(outcome.indexed_chunks, None);
    }

    #[tokio::test]
    async fn test_summarize_survives_indexing_failure() {
        let store = document_store(Arc::new(BrokenIndex));
        let llm = FakeLlm::new("summary anyway");
        let assistant = AssistantService::new(
            llm.clone(),
            Some(store),
            PromptsConfig::default(),
            options(),
        );

        let outcome = assistant
            .summarize_document("doc-1", "notes.txt", "Some document body.")
            .await
            .unwrap();

        assert_eq!(outcome.summary, "summary anyway");
        assert_eq!(outcome.indexed_chunks, None);
    }

    #[tokio::test]
    async fn test_summarize_truncates_the_document_in_the_prompt() {
        let llm = FakeLlm::new("short");
        let mut opts = options();
        opts.summary_max_chars = 20;
        let assistant = AssistantService::new(llm.clone(), None, PromptsConfig::default(), opts);
        let text = "b".repeat(60);

        assistant
            .summarize_document("doc-1", "notes.txt", &text)
            .await
            .unwrap();

        let prompt = &llm.calls()[0].1;
        assert!(!prompt.contains(&text));
        assert!(prompt.contains("bbb..."));
    }

    #[tokio::test]
    async fn test_answer_truncates_oversized_context() {
        let llm = FakeLlm::new("ok");
        let mut opts = options();
        opts.context_max_chars = 20;
        let assistant = AssistantService::new(llm.clone(), None, PromptsConfig::default(), opts);
        let fallback = "c".repeat(60);

        assistant
            .answer("Anything?", None, Some(&fallback))
            .await
            .unwrap();

        let prompt = &llm.calls()[0].1;
        assert!(!prompt.contains(&fallback));
        assert!(prompt.contains("ccc..."));
    }
}
