//! Sentiment classification through a language model.

use async_trait::async_trait;
use screener_core::error::AiError;
use screener_core::traits::{Sentiment, SentimentClassifier, SentimentLabel, TextGenerator};
use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::text::{clean_markdown_json, limit_tokens};

const CLASSIFIER_ROLE: &str = "Financial sentiment classifier";

/// Words of article text sent per request.
pub const DEFAULT_MAX_INPUT_TOKENS: usize = 512;

#[derive(Deserialize)]
struct RawSentiment {
    label: String,
    probability: f64,
}

/// Classifies text by asking a [`TextGenerator`] for
/// `{"label": ..., "probability": ...}`.
///
/// A reply that cannot be read as a sentiment counts as neutral; transport
/// and API errors are returned to the caller.
pub struct LlmSentimentClassifier {
    generator: Arc<dyn TextGenerator>,
    max_input_tokens: usize,
}

impl LlmSentimentClassifier {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator,
            max_input_tokens: DEFAULT_MAX_INPUT_TOKENS,
        }
    }

    pub fn with_max_input_tokens(mut self, max_input_tokens: usize) -> Self {
        self.max_input_tokens = max_input_tokens;
        self
    }

    fn prompt(&self, text: &str) -> String {
        format!(
            "Classify the sentiment of the following financial news for the company's stock.\n\
             Answer only with JSON of the form {{\"label\": \"positive\" | \"negative\" | \"neutral\", \
             \"probability\": <number between 0 and 1>}}.\n\n{}",
            limit_tokens(text, self.max_input_tokens)
        )
    }
}

/// Read a classifier reply; `None` when it is not a usable sentiment.
pub fn parse_sentiment(reply: &str) -> Option<Sentiment> {
    let raw: RawSentiment = serde_json::from_str(&clean_markdown_json(reply)).ok()?;
    let label = SentimentLabel::from_str(&raw.label).ok()?;
    if !raw.probability.is_finite() {
        return None;
    }

    Some(Sentiment {
        label,
        probability: raw.probability.clamp(0.0, 1.0),
    })
}

#[async_trait]
impl SentimentClassifier for LlmSentimentClassifier {
    async fn classify(&self, text: &str) -> Result<Sentiment, AiError> {
        if text.trim().is_empty() {
            return Ok(Sentiment::neutral());
        }

        let reply = self.generator.generate(CLASSIFIER_ROLE, &self.prompt(text)).await?;
        match parse_sentiment(&reply) {
            Some(sentiment) => {
                debug!(label = %sentiment.label, probability = sentiment.probability, "Classified text");
                Ok(sentiment)
            }
            None => {
                warn!(reply = %reply, "Unreadable sentiment reply, treating as neutral");
                Ok(Sentiment::neutral())
            }
        }
    }

    fn name(&self) -> &str {
        "llm"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Scripted {
        reply: String,
        prompts: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                prompts: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for Scripted {
        async fn generate(&self, _role: &str, prompt: &str) -> Result<String, AiError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            Ok(self.reply.clone())
        }

        fn name(&self) -> &str {
            "scripted"
        }
    }

    struct Failing;

    #[async_trait]
    impl TextGenerator for Failing {
        async fn generate(&self, _role: &str, _prompt: &str) -> Result<String, AiError> {
            Err(AiError::Connection("refused".to_string()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    #[test]
    fn test_parse_sentiment() {
        let parsed = parse_sentiment("```json\n{\"label\": \"Bearish\", \"probability\": 0.7}\n```").unwrap();
        assert_eq!(parsed.label, SentimentLabel::Negative);
        assert!((parsed.probability - 0.7).abs() < 1e-9);

        let clamped = parse_sentiment("{\"label\": \"positive\", \"probability\": 1.4}").unwrap();
        assert_eq!(clamped.probability, 1.0);

        assert!(parse_sentiment("{\"label\": \"great\", \"probability\": 0.9}").is_none());
        assert!(parse_sentiment("I think it is positive").is_none());
    }

    #[tokio::test]
    async fn test_classify() {
        let generator = Scripted::new("{\"label\": \"positive\", \"probability\": 0.9}");
        let classifier = LlmSentimentClassifier::new(generator.clone()).with_max_input_tokens(3);

        let sentiment = classifier.classify("Record revenue beats every estimate").await.unwrap();

        assert_eq!(sentiment.label, SentimentLabel::Positive);
        assert!((sentiment.score() - 0.9).abs() < 1e-9);
        let prompts = generator.prompts.lock().unwrap();
        assert!(prompts[0].ends_with("Record revenue beats"));
    }

    #[tokio::test]
    async fn test_unreadable_reply_is_neutral() {
        let classifier = LlmSentimentClassifier::new(Scripted::new("no idea"));
        let sentiment = classifier.classify("Some news").await.unwrap();
        assert_eq!(sentiment, Sentiment::neutral());
    }

    #[tokio::test]
    async fn test_empty_text_skips_model() {
        let generator = Scripted::new("{}");
        let classifier = LlmSentimentClassifier::new(generator.clone());

        assert_eq!(classifier.classify("  ").await.unwrap(), Sentiment::neutral());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generator_error_propagates() {
        let classifier = LlmSentimentClassifier::new(Arc::new(Failing));
        assert!(matches!(
            classifier.classify("news").await,
            Err(AiError::Connection(_))
        ));
    }
}
