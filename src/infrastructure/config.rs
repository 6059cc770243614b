use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}")]
    InvalidValue { name: String, value: String },

    #[error("cannot read prompts file '{path}': {source}")]
    PromptsRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse prompts file '{path}': {source}")]
    PromptsParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
    pub vector: VectorConfig,
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChunkingConfig {
    pub chunk_size: usize,
    pub overlap: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingConfig {
    pub model: String,
    pub dimension: usize,
    pub batch_size: usize,
    pub max_input_chars: usize,
    pub timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub timeout_seconds: u64,
}

/// `url: None` disables the vector backend entirely; the service then runs
/// without search, listing, deletion, or stats.
#[derive(Debug, Clone, Deserialize)]
pub struct VectorConfig {
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub collection: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssistantConfig {
    pub answer_top_k: usize,
    pub search_top_k: usize,
    pub context_max_chars: usize,
    pub summary_max_chars: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                max_upload_bytes: 10 * 1024 * 1024,
                cors_allowed_origins: vec!["*".to_string()],
            },
            chunking: ChunkingConfig {
                chunk_size: 1000,
                overlap: 200,
            },
            embedding: EmbeddingConfig {
                model: "text-embedding-3-small".to_string(),
                dimension: 1536,
                batch_size: 64,
                max_input_chars: 8000,
                timeout_seconds: 30,
            },
            llm: LlmConfig {
                model: "gpt-4o-mini".to_string(),
                timeout_seconds: 60,
            },
            vector: VectorConfig {
                url: None,
                api_key: None,
                collection: "doc-chat".to_string(),
                timeout_seconds: 10,
                max_retries: 3,
                retry_backoff_ms: 200,
            },
            assistant: AssistantConfig {
                answer_top_k: 3,
                search_top_k: 5,
                context_max_chars: 4000,
                summary_max_chars: 4000,
            },
        }
    }
}

impl Config {
    /// Reads every setting from the environment, falling back to defaults
    /// field by field. Unset is fine; a set-but-unparsable value is not.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        Ok(Self {
            server: ServerConfig {
                host: env_string("SERVER_HOST", defaults.server.host),
                port: env_parse("SERVER_PORT", defaults.server.port)?,
                max_upload_bytes: env_parse("MAX_UPLOAD_BYTES", defaults.server.max_upload_bytes)?,
                cors_allowed_origins: env_list(
                    "CORS_ALLOWED_ORIGINS",
                    defaults.server.cors_allowed_origins,
                ),
            },
            chunking: ChunkingConfig {
                chunk_size: env_parse("CHUNK_SIZE", defaults.chunking.chunk_size)?,
                overlap: env_parse("CHUNK_OVERLAP", defaults.chunking.overlap)?,
            },
            embedding: EmbeddingConfig {
                model: env_string("EMBEDDING_MODEL", defaults.embedding.model),
                dimension: env_parse("EMBEDDING_DIMENSION", defaults.embedding.dimension)?,
                batch_size: env_parse("EMBEDDING_BATCH_SIZE", defaults.embedding.batch_size)?,
                max_input_chars: env_parse(
                    "EMBEDDING_MAX_CHARS",
                    defaults.embedding.max_input_chars,
                )?,
                timeout_seconds: env_parse(
                    "EMBEDDING_TIMEOUT_SECONDS",
                    defaults.embedding.timeout_seconds,
                )?,
            },
            llm: LlmConfig {
                model: env_string("LLM_MODEL", defaults.llm.model),
                timeout_seconds: env_parse("LLM_TIMEOUT_SECONDS", defaults.llm.timeout_seconds)?,
            },
            vector: VectorConfig {
                url: env_opt("QDRANT_URL"),
                api_key: env_opt("QDRANT_API_KEY"),
                collection: env_string("QDRANT_COLLECTION", defaults.vector.collection),
                timeout_seconds: env_parse(
                    "QDRANT_TIMEOUT_SECONDS",
                    defaults.vector.timeout_seconds,
                )?,
                max_retries: env_parse("QDRANT_MAX_RETRIES", defaults.vector.max_retries)?,
                retry_backoff_ms: env_parse(
                    "QDRANT_RETRY_BACKOFF_MS",
                    defaults.vector.retry_backoff_ms,
                )?,
            },
            assistant: AssistantConfig {
                answer_top_k: env_parse("ANSWER_TOP_K", defaults.assistant.answer_top_k)?,
                search_top_k: env_parse("SEARCH_TOP_K", defaults.assistant.search_top_k)?,
                context_max_chars: env_parse(
                    "CONTEXT_MAX_CHARS",
                    defaults.assistant.context_max_chars,
                )?,
                summary_max_chars: env_parse(
                    "SUMMARY_MAX_CHARS",
                    defaults.assistant.summary_max_chars,
                )?,
            },
        })
    }
}

/// Prompt templates for the assistant. `{document}`, `{context}` and
/// `{question}` placeholders are substituted at call time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PromptsConfig {
    pub summary_system: String,
    pub summary_user: String,
    pub answer_system: String,
    pub answer_user: String,
    pub no_context_message: String,
}

impl Default for PromptsConfig {
    fn default() -> Self {
        Self {
            summary_system: "You are a helpful assistant that provides clear, concise summaries \
                             of documents. Always be accurate and helpful."
                .to_string(),
            summary_user: "Please provide a comprehensive summary of the following document:\
                           \n\n{document}"
                .to_string(),
            answer_system: "You are a helpful assistant that answers questions about documents. \
                            Always be accurate and helpful based on the document content. If the \
                            information is not in the provided context, say so."
                .to_string(),
            answer_user: "Based on the following document context, answer this question: \
                          '{question}'\n\nDocument Context:\n{context}"
                .to_string(),
            no_context_message: "I don't have enough context to answer this question. Please \
                                 upload a document first."
                .to_string(),
        }
    }
}

impl PromptsConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::PromptsRead {
            path: path.display().to_string(),
            source,
        })?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::PromptsParse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Everything the binary needs to wire itself: environment settings plus the
/// prompt templates (file at `PROMPTS_PATH` when present, compiled defaults
/// otherwise).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config: Config,
    pub prompts: PromptsConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::from_env()?;

        let prompts_path =
            std::env::var("PROMPTS_PATH").unwrap_or_else(|_| "config/prompts.yaml".to_string());
        let prompts = if Path::new(&prompts_path).exists() {
            PromptsConfig::from_file(&prompts_path)?
        } else {
            PromptsConfig::default()
        };

        Ok(Self { config, prompts })
    }
}

fn env_string(name: &str, default: String) -> String {
    std::env::var(name).unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

fn env_list(name: &str, default: Vec<String>) -> Vec<String> {
    match std::env::var(name) {
        Ok(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(str::to_string)
            .collect(),
        Err(_) => default,
    }
}

fn env_parse<T: FromStr>(name: &str, default: T) -> Result<T, ConfigError> {
    match std::env::var(name) {
        Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidValue {
            name: name.to_string(),
            value: raw,
        }),
        Err(_) => Ok(default),
    }
}
