use std::time::Duration;

use async_trait::async_trait;
use rig::client::{CompletionClient, ProviderClient};
use rig::completion::Prompt;
use rig::providers::openai;

use crate::domain::{errors::LlmError, ports::LlmService};
use crate::infrastructure::config::LlmConfig;

/// OpenAI chat completions through rig, each call bounded by the configured
/// timeout.
pub struct OpenAiLlm {
    client: openai::Client,
    model: String,
    timeout: Duration,
}

impl OpenAiLlm {
    /// Reads `OPENAI_API_KEY` from the environment; the caller is expected
    /// to have checked it is set.
    pub fn from_env(config: &LlmConfig) -> Self {
        Self {
            client: openai::Client::from_env(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_seconds),
        }
    }

    async fn prompt_agent(
        &self,
        system: Option<&str>,
        prompt: &str,
    ) -> Result<String, LlmError> {
        let mut builder = self.client.agent(&self.model);
        if let Some(system) = system {
            builder = builder.preamble(system);
        }
        let agent = builder.build();

        tokio::time::timeout(self.timeout, agent.prompt(prompt))
            .await
            .map_err(|_| LlmError::Timeout {
                seconds: self.timeout.as_secs(),
            })?
            .map_err(|e| LlmError::Provider(e.to_string()))
            .map(|answer| answer.trim().to_string())
    }
}

#[async_trait]
impl LlmService for OpenAiLlm {
    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        self.prompt_agent(None, prompt).await
    }

    async fn complete_with_system(&self, system: &str, prompt: &str) -> Result<String, LlmError> {
        self.prompt_agent(Some(system), prompt).await
    }
}
