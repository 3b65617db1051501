/// Per-session configuration
///
/// Provider choice and backend settings travel with the session object rather
/// than living in process-wide state:
/// - Provider selection (local Ollama or OpenAI-compatible API)
/// - Ollama host/model and health probe timeout
/// - OpenAI key, model and sampling parameters

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use anyhow::{Context, Result};

pub const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-3.5-turbo";

/// Which backend interprets natural-language queries
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Ollama,
    #[serde(alias = "open_ai")]
    OpenAi,
}

impl Provider {
    pub fn label(&self) -> &'static str {
        match self {
            Provider::Ollama => "Ollama",
            Provider::OpenAi => "OpenAI",
        }
    }
}

impl Default for Provider {
    fn default() -> Self {
        Provider::Ollama
    }
}

/// Session configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Active provider
    pub provider: Provider,

    /// Local Ollama server settings
    pub ollama: OllamaConfig,

    /// OpenAI-compatible API settings
    pub openai: OpenAiConfig,
}

/// Ollama configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaConfig {
    /// Base URL of the Ollama server
    pub host: String,

    /// Model name passed to /api/generate
    pub model: String,

    /// Timeout for the /api/tags reachability probe (seconds)
    pub health_timeout_secs: u64,
}

/// OpenAI configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiConfig {
    /// API key; requests are refused locally when absent
    pub api_key: Option<String>,

    /// Chat model
    pub model: String,

    /// API base URL (no trailing slash)
    pub base_url: String,

    /// Max tokens to generate
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_OLLAMA_HOST.to_string(),
            model: DEFAULT_OLLAMA_MODEL.to_string(),
            health_timeout_secs: 2,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: DEFAULT_OPENAI_BASE_URL.to_string(),
            max_tokens: 500,
            temperature: 0.5,
        }
    }
}

impl OllamaConfig {
    pub fn health_timeout(&self) -> Duration {
        Duration::from_secs(self.health_timeout_secs)
    }
}

impl SessionConfig {
    /// Parse a JSON config document; omitted fields take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Invalid session configuration JSON")
    }

    /// Load a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_json_str(&text)
    }

    /// Fill the OpenAI key from the environment when the config leaves it empty
    pub fn with_env_api_key(mut self) -> Self {
        let missing = self.openai.api_key.as_deref().map_or(true, str::is_empty);
        if missing {
            if let Ok(key) = std::env::var("OPENAI_API_KEY") {
                if !key.is_empty() {
                    self.openai.api_key = Some(key);
                }
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.provider, Provider::Ollama);
        assert_eq!(config.ollama.host, "http://localhost:11434");
        assert_eq!(config.ollama.model, "llama3");
        assert_eq!(config.ollama.health_timeout(), Duration::from_secs(2));
        assert_eq!(config.openai.max_tokens, 500);
        assert!(config.openai.api_key.is_none());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SessionConfig::from_json_str(
            r#"{"provider": "openai", "openai": {"api_key": "sk-test"}}"#,
        )
        .unwrap();
        assert_eq!(config.provider, Provider::OpenAi);
        assert_eq!(config.openai.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.openai.model, "gpt-3.5-turbo");
        assert_eq!(config.ollama.model, "llama3");
    }

    #[test]
    fn test_unknown_provider_rejected() {
        assert!(SessionConfig::from_json_str(r#"{"provider": "bard"}"#).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, r#"{"ollama": {"model": "mistral"}}"#).unwrap();
        let config = SessionConfig::from_file(&path).unwrap();
        assert_eq!(config.ollama.model, "mistral");
        assert_eq!(config.ollama.host, DEFAULT_OLLAMA_HOST);
    }
}
