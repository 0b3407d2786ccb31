//! Test doubles and fixtures shared by the finder tests.

use async_trait::async_trait;
use chrono::{Duration, NaiveDate};
use screener_config::AppConfig;
use screener_core::error::AiError;
use screener_core::traits::{Sentiment, SentimentClassifier, SentimentLabel, TextGenerator};
use screener_core::types::{
    AnalystGrade, Bar, FinancialRatios, IncomeGrowth, PriceHistory, StockListing,
};
use screener_data::InMemorySource;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::FinderContext;

/// Generator that always replies with the same text and records prompts.
pub struct Scripted {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl Scripted {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }

    pub fn prompt_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
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

/// Generator whose every call fails.
pub struct Failing;

#[async_trait]
impl TextGenerator for Failing {
    async fn generate(&self, _role: &str, _prompt: &str) -> Result<String, AiError> {
        Err(AiError::Connection("offline".into()))
    }

    fn name(&self) -> &str {
        "failing"
    }
}

/// Classifier that calls every text positive.
pub struct Upbeat;

#[async_trait]
impl SentimentClassifier for Upbeat {
    async fn classify(&self, _text: &str) -> Result<Sentiment, AiError> {
        Ok(Sentiment {
            label: SentimentLabel::Positive,
            probability: 0.9,
        })
    }

    fn name(&self) -> &str {
        "upbeat"
    }
}

/// Classifier that records its inputs and calls everything neutral.
#[derive(Default)]
pub struct Recorder {
    texts: Mutex<Vec<String>>,
}

impl Recorder {
    pub fn texts(&self) -> Vec<String> {
        self.texts.lock().unwrap().clone()
    }
}

#[async_trait]
impl SentimentClassifier for Recorder {
    async fn classify(&self, text: &str) -> Result<Sentiment, AiError> {
        self.texts.lock().unwrap().push(text.to_string());
        Ok(Sentiment {
            label: SentimentLabel::Neutral,
            probability: 0.5,
        })
    }

    fn name(&self) -> &str {
        "recorder"
    }
}

pub fn as_of() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 28).unwrap()
}

pub fn days_ago(days: i64) -> NaiveDate {
    as_of() - Duration::days(days)
}

/// Liquid mid-cap listing that passes the default universe query.
pub fn listing(symbol: &str, industry: &str) -> StockListing {
    StockListing {
        market_cap: Some(2_000_000_000.0),
        price: Some(50.0),
        volume: Some(1_000_000.0),
        exchange_short_name: Some("NASDAQ".to_string()),
        country: Some("US".to_string()),
        is_etf: Some(false),
        is_actively_trading: Some(true),
        ..StockListing::new(symbol).with_industry(industry)
    }
}

/// Daily closes ending at the as-of date.
pub fn history(symbol: &str, closes: &[f64]) -> PriceHistory {
    let n = closes.len() as i64;
    let bars = closes
        .iter()
        .enumerate()
        .map(|(i, close)| Bar::close_only(days_ago(n - 1 - i as i64), *close))
        .collect();
    PriceHistory::new(symbol, bars)
}

/// Straight line from `start` to `end` over `days` daily bars.
pub fn trending(symbol: &str, days: usize, start: f64, end: f64) -> PriceHistory {
    let step = (end - start) / (days - 1) as f64;
    let closes: Vec<f64> = (0..days).map(|i| start + step * i as f64).collect();
    history(symbol, &closes)
}

pub fn ratios(days: i64, roe: f64, debt_equity: f64, pe: f64) -> FinancialRatios {
    FinancialRatios {
        date: days_ago(days),
        return_on_equity: Some(roe),
        debt_equity_ratio: Some(debt_equity),
        price_earnings_ratio: Some(pe),
        price_to_sales_ratio: None,
        price_to_book_ratio: None,
        current_ratio: None,
        gross_profit_margin: None,
        net_profit_margin: None,
        dividend_yield: None,
    }
}

pub fn growth(days: i64, revenue: f64, net_income: f64) -> IncomeGrowth {
    IncomeGrowth {
        date: days_ago(days),
        growth_revenue: Some(revenue),
        growth_net_income: Some(net_income),
        growth_eps: None,
    }
}

/// `count` grades with the same label, one every five days.
pub fn grades(count: usize, label: &str) -> Vec<AnalystGrade> {
    (0..count)
        .map(|i| AnalystGrade::new(days_ago(5 * (i as i64 + 1)), label))
        .collect()
}

/// Default settings with every output directory under `dir`.
pub fn config_in(dir: &Path) -> AppConfig {
    let mut config = AppConfig::default();
    config.paths.cache_dir = dir.join("cache");
    config.paths.results_dir = dir.join("results");
    config.paths.reports_dir = dir.join("reports");
    config.paths.logs_dir = dir.join("logs");
    config
}

pub fn context(source: InMemorySource, dir: &Path) -> FinderContext {
    FinderContext::new(Arc::new(source), config_in(dir), as_of())
}
