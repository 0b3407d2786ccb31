//! OpenAI-compatible chat completions client.

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use reqwest::Client;
use screener_core::error::AiError;
use screener_core::traits::TextGenerator;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::cache::ResponseCache;
use crate::text::clean_markdown_json;

/// Default API root.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Default chat model.
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";

/// Client configuration.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_OPENAI_MODEL.to_string(),
            base_url: OPENAI_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    /// Load the API key from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, AiError> {
        let api_key = std::env::var(var)
            .map_err(|_| AiError::Configuration(format!("{} not set", var)))?;
        if api_key.trim().is_empty() {
            return Err(AiError::Configuration(format!("{} is empty", var)));
        }
        Ok(Self::new(api_key))
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    temperature: f64,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Deserialize)]
pub(crate) struct ReplyMessage {
    #[serde(default)]
    pub content: Option<String>,
}

/// Chat completions client with an optional per-day reply cache.
pub struct OpenAiClient {
    config: OpenAiConfig,
    client: Client,
    cache: Option<ResponseCache>,
    today: Option<NaiveDate>,
}

impl OpenAiClient {
    pub fn new(config: OpenAiConfig) -> Result<Self, AiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AiError::Connection(e.to_string()))?;

        info!(model = %config.model, base_url = %config.base_url, "OpenAI client ready");
        Ok(Self {
            config,
            client,
            cache: None,
            today: None,
        })
    }

    /// Create from an environment variable holding the API key.
    pub fn from_env(var: &str) -> Result<Self, AiError> {
        Self::new(OpenAiConfig::from_env(var)?)
    }

    /// Cache replies per prompt and day.
    pub fn with_cache(mut self, cache: ResponseCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Pin the cache date instead of using the local clock.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn complete(&self, role: &str, prompt: &str) -> Result<String, AiError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let request = ChatRequest {
            model: &self.config.model,
            temperature: 0.0,
            messages: [
                ChatMessage { role: "system", content: role },
                ChatMessage { role: "user", content: prompt },
            ],
        };

        debug!(model = %self.config.model, prompt_len = prompt.len(), "Chat completion request");
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
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

        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| clean_markdown_json(&content))
            .ok_or_else(|| AiError::InvalidResponse("no completion in response".to_string()))
    }
}

#[async_trait]
impl TextGenerator for OpenAiClient {
    async fn generate(&self, role: &str, prompt: &str) -> Result<String, AiError> {
        let today = self.today();

        if let Some(cache) = &self.cache {
            match cache.load(prompt, today) {
                Ok(Some(reply)) => return Ok(reply),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "Ignoring unreadable cached reply"),
            }
        }

        let reply = self.complete(role, prompt).await?;

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.store(prompt, today, &self.config.model, &reply) {
                warn!(error = %e, "Failed to cache model reply");
            }
        }

        Ok(reply)
    }

    fn name(&self) -> &str {
        "openai"
    }
}
