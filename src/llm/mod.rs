//! LLM Module - prompt construction, model backends and response parsing

pub mod prompt;
pub mod response_parser;
pub mod backend;
pub mod ollama_client;
pub mod openai_client;

pub use prompt::build_prompt;
pub use response_parser::{extract_json_object, parse_llm_response, ExtractionStrategy};
pub use backend::{backend_for, CompletionBackend};
pub use ollama_client::OllamaClient;
pub use openai_client::OpenAiClient;
