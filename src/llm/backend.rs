//! Completion backend capability
//!
//! The pipeline only needs `complete(prompt) -> text | failure`; concrete
//! providers and test doubles implement this trait.

use crate::config::{Provider, SessionConfig};
use crate::error::VizResult;
use crate::llm::ollama_client::OllamaClient;
use crate::llm::openai_client::OpenAiClient;
use async_trait::async_trait;

#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Provider name used in logs and error messages
    fn name(&self) -> &str;

    /// Send a prompt and return the raw response text
    async fn complete(&self, prompt: &str) -> VizResult<String>;
}

/// Construct the backend selected by the session configuration
pub fn backend_for(config: &SessionConfig) -> Box<dyn CompletionBackend> {
    match config.provider {
        Provider::Ollama => Box::new(OllamaClient::from_config(&config.ollama)),
        Provider::OpenAi => Box::new(OpenAiClient::new(config.openai.clone())),
    }
}
