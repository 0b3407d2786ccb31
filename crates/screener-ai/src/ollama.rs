//! Local Ollama chat client.

use async_trait::async_trait;
use reqwest::Client;
use screener_core::error::AiError;
use screener_core::traits::TextGenerator;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::openai::{ChatMessage, ReplyMessage};
use crate::text::clean_markdown_json;

/// Default local server.
pub const OLLAMA_BASE_URL: &str = "http://localhost:11434";

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    stream: bool,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ReplyMessage,
}

/// Client for a local Ollama server, non-streaming.
pub struct OllamaClient {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaClient {
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| AiError::Connection(e.to_string()))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();
        let model = model.into();
        info!(%base_url, %model, "Ollama client ready");

        Ok(Self {
            base_url,
            model,
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, role: &str, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/api/chat", self.base_url);
        let request = ChatRequest {
            model: &self.model,
            stream: false,
            messages: [
                ChatMessage { role: "system", content: role },
                ChatMessage { role: "user", content: prompt },
            ],
        };

        debug!(model = %self.model, "Ollama chat request");
        let resp = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| AiError::Connection(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(AiError::ApiError(format!("{}: {}", status, text)));
        }

        let body: ChatResponse = resp
            .json()
            .await
            .map_err(|e| AiError::InvalidResponse(e.to_string()))?;

        body.message
            .content
            .map(|content| clean_markdown_json(&content))
            .ok_or_else(|| AiError::InvalidResponse("empty message".to_string()))
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_generate() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .and(body_partial_json(json!({"model": "llama3", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3",
                "message": {"role": "assistant", "content": " Strong moat. "},
                "done": true
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::new(format!("{}/", server.uri()), "llama3").unwrap();
        let reply = client.generate("Financial analyst", "Describe AAPL").await.unwrap();

        assert_eq!(reply, "Strong moat.");
        assert_eq!(client.name(), "ollama");
    }

    #[tokio::test]
    async fn test_server_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(server.uri(), "missing").unwrap();
        let result = client.generate("analyst", "hi").await;
        assert!(matches!(result, Err(AiError::ApiError(_))));
    }
}
