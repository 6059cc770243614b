use std::sync::Arc;

use crate::application::{AssistantService, DocumentVectorStore};
use crate::infrastructure::AppConfig;

/// Shared handler state. Both services are optional capabilities: `None`
/// means the backing provider is not configured and the routes that need it
/// answer 503 instead of failing at startup.
#[derive(Clone)]
pub struct AppState {
    pub assistant: Option<Arc<AssistantService>>,
    pub vector_store: Option<Arc<DocumentVectorStore>>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            assistant: None,
            vector_store: None,
            config: Arc::new(config),
        }
    }

    pub fn with_assistant(mut self, service: Arc<AssistantService>) -> Self {
        self.assistant = Some(service);
        self
    }

    pub fn with_vector_store(mut self, service: Arc<DocumentVectorStore>) -> Self {
        self.vector_store = Some(service);
        self
    }
}
