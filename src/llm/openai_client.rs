//! OpenAI Client - Chat completions against an OpenAI-compatible API

use crate::config::OpenAiConfig;
use crate::error::{VizError, VizResult};
use crate::llm::backend::CompletionBackend;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const PROVIDER: &str = "OpenAI";

#[derive(Clone)]
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    fn api_key(&self) -> VizResult<&str> {
        self.config
            .api_key
            .as_deref()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| VizError::backend(PROVIDER, "Please provide an OpenAI API key."))
    }

    /// Single-turn chat completion; returns the trimmed assistant message
    pub async fn chat(&self, prompt: &str) -> VizResult<String> {
        let api_key = self.api_key()?;
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("OpenAI query error: {}", e);
                VizError::backend(PROVIDER, format!("Error communicating with OpenAI: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!("OpenAI API error: Status {}", status.as_u16());
            return Err(VizError::backend_status(PROVIDER, status.as_u16()));
        }

        let body: ChatResponse = response.json().await.map_err(|e| {
            VizError::backend(PROVIDER, format!("Failed to parse OpenAI response: {}", e))
        })?;

        let content = body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();
        Ok(content.trim().to_string())
    }
}

#[async_trait]
impl CompletionBackend for OpenAiClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str) -> VizResult<String> {
        self.chat(prompt).await
    }
}
