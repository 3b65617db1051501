//! Ollama Client - Integration with a local Ollama LLM server

use crate::config::OllamaConfig;
use crate::error::{VizError, VizResult};
use crate::llm::backend::CompletionBackend;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const PROVIDER: &str = "Ollama";

/// Ollama API client
#[derive(Clone)]
pub struct OllamaClient {
    base_url: String,
    model: String,
    health_timeout: Duration,
    client: Client,
}

#[derive(Serialize)]
struct OllamaRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Deserialize, Debug)]
struct OllamaResponse {
    #[serde(default)]
    response: String,
}

impl OllamaClient {
    /// Create a new Ollama client
    pub fn new(base_url: Option<String>, model: Option<String>) -> Self {
        let defaults = OllamaConfig::default();
        Self {
            base_url: normalize_host(&base_url.unwrap_or(defaults.host)),
            model: model.unwrap_or(defaults.model),
            health_timeout: Duration::from_secs(defaults.health_timeout_secs),
            client: Client::new(),
        }
    }

    pub fn from_config(config: &OllamaConfig) -> Self {
        Self {
            base_url: normalize_host(&config.host),
            model: config.model.clone(),
            health_timeout: config.health_timeout(),
            client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a completion (non-streaming)
    pub async fn generate(&self, prompt: &str) -> VizResult<String> {
        let url = format!("{}/api/generate", self.base_url);
        let request = OllamaRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, "Ollama query error: {}", e);
                VizError::backend(PROVIDER, format!("Error communicating with Ollama: {}", e))
            })?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::error!("Ollama API error: Status {}", status.as_u16());
            return Err(VizError::backend_status(PROVIDER, status.as_u16()));
        }

        let body: OllamaResponse = response.json().await.map_err(|e| {
            VizError::backend(PROVIDER, format!("Failed to parse Ollama response: {}", e))
        })?;
        Ok(body.response)
    }

    /// Check if the Ollama server is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/tags", self.base_url);
        match self
            .client
            .get(&url)
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(resp) => resp.status() == StatusCode::OK,
            Err(e) => {
                tracing::debug!(url = %url, "Ollama health probe failed: {}", e);
                false
            }
        }
    }
}

#[async_trait]
impl CompletionBackend for OllamaClient {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn complete(&self, prompt: &str) -> VizResult<String> {
        self.generate(prompt).await
    }
}

impl Default for OllamaClient {
    fn default() -> Self {
        Self::new(None, None)
    }
}

fn normalize_host(host: &str) -> String {
    let host = host.trim();
    let host = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        format!("http://{}", host)
    };
    host.trim_end_matches('/').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Local server answering each of `responses` on its own connection, in order
    async fn serve(responses: Vec<&'static str>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            for response in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                read_request(&mut socket).await;
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
        });
        format!("http://{}", addr)
    }

    /// Drain headers plus a Content-Length body
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| {
                        let (key, value) = line.split_once(':')?;
                        key.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    #[test]
    fn test_defaults() {
        let client = OllamaClient::default();
        assert_eq!(client.base_url(), "http://localhost:11434");
        assert_eq!(client.model(), "llama3");
    }

    #[test]
    fn test_host_normalization() {
        assert_eq!(normalize_host("localhost:11434/"), "http://localhost:11434");
        assert_eq!(normalize_host("https://gpu.box/"), "https://gpu.box");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(OllamaRequest {
            model: "llama3",
            prompt: "hi",
            stream: false,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "llama3", "prompt": "hi", "stream": false}));
    }

    #[tokio::test]
    async fn test_unreachable_host_reports_transport_error() {
        let client = OllamaClient::new(Some("http://127.0.0.1:9".to_string()), None);
        assert!(!client.health_check().await);
        let err = client.generate("hi").await.unwrap_err();
        assert!(matches!(err, VizError::Backend { status: None, .. }));
    }

    #[tokio::test]
    async fn test_non_ok_status_is_reported() {
        let url = serve(vec![
            "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        ])
        .await;
        let client = OllamaClient::new(Some(url), None);

        let err = client.generate("hi").await.unwrap_err();
        assert_eq!(err, VizError::backend_status("Ollama", 500));
        assert!(matches!(err, VizError::Backend { status: Some(500), .. }));
        assert_eq!(err.to_string(), "Ollama error: API error: Status 500");

        assert!(!client.health_check().await);
    }

    #[tokio::test]
    async fn test_ok_reply_and_health() {
        let url = serve(vec![
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 17\r\nConnection: close\r\n\r\n{\"response\":\"hi\"}",
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 13\r\nConnection: close\r\n\r\n{\"models\":[]}",
        ])
        .await;
        let client = OllamaClient::new(Some(url), None);
        assert_eq!(client.generate("hello").await.unwrap(), "hi");
        assert!(client.health_check().await);
    }
}
