//! Language model and sentiment classifier traits.

use crate::error::AiError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Trait for text generation backends (hosted or local LLMs).
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion.
    ///
    /// # Arguments
    /// * `role` - Persona for the system message (e.g. "Financial analyst")
    /// * `prompt` - The user prompt
    async fn generate(&self, role: &str, prompt: &str) -> Result<String, AiError>;

    /// Get the backend name.
    fn name(&self) -> &str;
}

/// Sentiment class of a text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SentimentLabel::Positive => "positive",
            SentimentLabel::Negative => "negative",
            SentimentLabel::Neutral => "neutral",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for SentimentLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "bullish" => Ok(SentimentLabel::Positive),
            "negative" | "bearish" => Ok(SentimentLabel::Negative),
            "neutral" => Ok(SentimentLabel::Neutral),
            _ => Err(format!("Invalid sentiment label: {}", s)),
        }
    }
}

/// Classifier output: the most likely label and its probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: SentimentLabel,
    pub probability: f64,
}

impl Sentiment {
    /// A neutral result.
    pub fn neutral() -> Self {
        Self {
            label: SentimentLabel::Neutral,
            probability: 1.0,
        }
    }

    /// Signed score: `+p` for positive, `-p` for negative, `0` for neutral.
    pub fn score(&self) -> f64 {
        match self.label {
            SentimentLabel::Positive => self.probability,
            SentimentLabel::Negative => -self.probability,
            SentimentLabel::Neutral => 0.0,
        }
    }
}

/// Trait for text sentiment classifiers.
#[async_trait]
pub trait SentimentClassifier: Send + Sync {
    /// Classify a piece of text.
    async fn classify(&self, text: &str) -> Result<Sentiment, AiError>;

    /// Get the classifier name.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentiment_score_sign() {
        let positive = Sentiment {
            label: SentimentLabel::Positive,
            probability: 0.8,
        };
        let negative = Sentiment {
            label: SentimentLabel::Negative,
            probability: 0.6,
        };

        assert!((positive.score() - 0.8).abs() < 0.001);
        assert!((negative.score() + 0.6).abs() < 0.001);
        assert_eq!(Sentiment::neutral().score(), 0.0);
    }

    #[test]
    fn test_label_parse() {
        assert_eq!(SentimentLabel::from_str("Positive").unwrap(), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_str(" negative ").unwrap(), SentimentLabel::Negative);
        assert!(SentimentLabel::from_str("meh").is_err());
    }
}
