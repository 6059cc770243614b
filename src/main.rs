use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doc_chat::api::{create_router, AppState};
use doc_chat::application::{AssistantService, DocumentVectorStore};
use doc_chat::domain::{ports::VectorIndex, Chunker};
use doc_chat::infrastructure::{AppConfig, OpenAiEmbedder, OpenAiLlm, QdrantVectorIndex};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "doc_chat=debug,api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenvy::dotenv().ok();

    let config = AppConfig::load()?;

    let ai_configured = std::env::var("OPENAI_API_KEY").is_ok();
    if !ai_configured {
        warn!("OPENAI_API_KEY is not set, summaries and chat are disabled");
    }

    let vector_index: Option<Arc<dyn VectorIndex>> = match &config.config.vector.url {
        Some(url) => {
            let connected = QdrantVectorIndex::connect(
                url,
                &config.config.vector,
                config.config.embedding.dimension,
            )
            .await;
            match connected {
                Ok(index) => {
                    info!(collection = %config.config.vector.collection, "qdrant connected");
                    Some(Arc::new(index))
                }
                Err(error) => {
                    warn!(%error, "vector index unavailable, continuing without it");
                    None
                }
            }
        }
        None => {
            info!("QDRANT_URL is not set, running without vector search");
            None
        }
    };

    let vector_store = match vector_index {
        Some(index) if ai_configured => {
            let chunker = Chunker::new(
                config.config.chunking.chunk_size,
                config.config.chunking.overlap,
            )?;
            let embedder = Arc::new(OpenAiEmbedder::from_env(&config.config.embedding));
            Some(Arc::new(DocumentVectorStore::new(
                chunker,
                embedder,
                index,
                config.config.embedding.max_input_chars,
            )))
        }
        Some(_) => {
            warn!("vector index is configured but unusable without OPENAI_API_KEY");
            None
        }
        None => None,
    };

    let assistant = if ai_configured {
        let llm = Arc::new(OpenAiLlm::from_env(&config.config.llm));
        Some(Arc::new(AssistantService::new(
            llm,
            vector_store.clone(),
            config.prompts.clone(),
            config.config.assistant.clone(),
        )))
    } else {
        None
    };

    let host = config.config.server.host.clone();
    let port = config.config.server.port;

    let mut state = AppState::new(config);
    if let Some(assistant) = assistant {
        state = state.with_assistant(assistant);
    }
    if let Some(store) = vector_store {
        state = state.with_vector_store(store);
    }
    let app = create_router(state);

    let addr = SocketAddr::new(host.parse()?, port);
    info!("API server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
