//! Core traits for the stock screener.

mod indicator;
mod language_model;
mod market_data;

pub use indicator::Indicator;
pub use language_model::{Sentiment, SentimentClassifier, SentimentLabel, TextGenerator};
pub use market_data::{MarketDataSource, ScreenerQuery};
