//! Language model clients.
//!
//! - `OpenAiClient`: OpenAI-compatible chat completions with a per-day
//!   reply cache
//! - `OllamaClient`: local models through Ollama
//! - `LlmSentimentClassifier`: news sentiment from any `TextGenerator`

mod cache;
mod ollama;
mod openai;
mod sentiment;
mod text;

pub use cache::ResponseCache;
pub use ollama::{OllamaClient, OLLAMA_BASE_URL};
pub use openai::{OpenAiClient, OpenAiConfig, DEFAULT_OPENAI_MODEL, OPENAI_BASE_URL};
pub use sentiment::{parse_sentiment, LlmSentimentClassifier, DEFAULT_MAX_INPUT_TOKENS};
pub use text::{clean_markdown_json, limit_tokens};
