pub mod config;
pub mod embedding;
pub mod extract;
pub mod llm;
pub mod vector_index;

pub use config::{AppConfig, Config, PromptsConfig};
pub use embedding::OpenAiEmbedder;
pub use llm::OpenAiLlm;
pub use vector_index::{InMemoryVectorIndex, QdrantVectorIndex};
