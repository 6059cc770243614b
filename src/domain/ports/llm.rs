use async_trait::async_trait;

use crate::domain::errors::LlmError;

#[async_trait]
pub trait LlmService: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LlmError>;
}
