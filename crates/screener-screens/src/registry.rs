//! Screener registry: names, descriptions and default configurations.

use crate::config::ScreenConfig;
use crate::{
    AnalystRatingsConfig, DividendYieldConfig, EarningsEstimateConfig, FiftyTwoWeekLowConfig,
    GrowthFactorConfig, GrowthScreenerConfig, MomentumFactorConfig, MomentumScreenerConfig,
    PriceTargetConfig, QualityFactorConfig, SocialSentimentConfig,
};
use screener_core::error::StatsError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Information about a registered screener.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenerInfo {
    /// Screener name
    pub name: String,
    /// Screener description
    pub description: String,
    /// Default configuration as JSON (`{}` for screeners without settings)
    pub default_config: Value,
}

/// Registry of the available screeners and scoring factors.
pub struct ScreenerRegistry {
    screeners: HashMap<String, ScreenerInfo>,
}

impl ScreenerRegistry {
    /// Create a registry with every built-in screener.
    pub fn new() -> Self {
        let mut registry = Self {
            screeners: HashMap::new(),
        };

        registry.register::<GrowthScreenerConfig>(
            "growth",
            "Growth Screener",
            "Accelerating quarterly revenue and earnings growth above a minimum",
        );
        registry.register::<FiftyTwoWeekLowConfig>(
            "fifty_two_week_low",
            "52-Week Low",
            "Drop of the last close from the 52-week high",
        );
        registry.register::<MomentumScreenerConfig>(
            "momentum",
            "Momentum Screener",
            "Six month price change, skipping the most recent day",
        );
        registry.register::<MomentumFactorConfig>(
            "momentum_factor",
            "Momentum Factor",
            "Blend of six and twelve month excess returns",
        );
        registry.register::<GrowthFactorConfig>(
            "growth_factor",
            "Growth Factor",
            "Weighted annual revenue and net income growth",
        );
        registry.register::<QualityFactorConfig>(
            "quality_factor",
            "Quality Factor",
            "Return on equity net of leverage, quarterly and annual",
        );
        registry.register::<EarningsEstimateConfig>(
            "earnings_estimate",
            "Earnings Estimates",
            "Consensus EPS growth over the next reporting periods",
        );
        registry.register::<AnalystRatingsConfig>(
            "analyst_ratings",
            "Analyst Ratings",
            "Bullish minus bearish analyst grade changes in a recent window",
        );
        registry.register::<PriceTargetConfig>(
            "price_target",
            "Price Targets",
            "Average analyst price target upside and agreement",
        );
        registry.register::<DividendYieldConfig>(
            "dividend_yield",
            "Dividend Yield",
            "Average yearly dividend yield over the last three years",
        );
        registry.register::<SocialSentimentConfig>(
            "social_sentiment",
            "Social Sentiment",
            "Mean StockTwits sentiment over the last month",
        );
        registry.register_plain(
            "news_sentiment",
            "News Sentiment",
            "Classifier sentiment of the latest news articles",
        );
        registry.register_plain(
            "institutional_ownership",
            "Institutional Ownership",
            "Holder counts, invested capital and put/call ratio",
        );
        registry.register_plain(
            "quarterly_revenue_growth",
            "Quarterly Revenue Growth",
            "Average quarter-over-quarter revenue growth",
        );
        registry.register_plain(
            "company_outlook",
            "Company Outlook",
            "Statement trends and weighted section scores",
        );

        registry
    }

    fn register<T: ScreenConfig>(&mut self, key: &str, name: &str, description: &str) {
        let default_config = serde_json::to_value(T::default()).unwrap_or(Value::Null);
        self.insert(key, name, description, default_config);
    }

    fn register_plain(&mut self, key: &str, name: &str, description: &str) {
        self.insert(key, name, description, Value::Object(Default::default()));
    }

    fn insert(&mut self, key: &str, name: &str, description: &str, default_config: Value) {
        self.screeners.insert(
            key.to_string(),
            ScreenerInfo {
                name: name.to_string(),
                description: description.to_string(),
                default_config,
            },
        );
    }

    /// List all screeners, ordered by key.
    pub fn list(&self) -> Vec<(&str, &ScreenerInfo)> {
        let mut entries: Vec<(&str, &ScreenerInfo)> =
            self.screeners.iter().map(|(k, v)| (k.as_str(), v)).collect();
        entries.sort_by_key(|(k, _)| *k);
        entries
    }

    /// Get screener info by key.
    pub fn get(&self, key: &str) -> Option<&ScreenerInfo> {
        self.screeners.get(key)
    }

    /// Check if a screener exists.
    pub fn exists(&self, key: &str) -> bool {
        self.screeners.contains_key(key)
    }

    /// Get all screener keys, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.screeners.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a validated configuration for a screener.
    ///
    /// # Arguments
    /// * `key` - Registered screener key
    /// * `overrides` - JSON object whose fields replace the defaults
    ///
    /// # Returns
    /// The merged configuration, after `validate`
    pub fn config<T: ScreenConfig>(&self, key: &str, overrides: Option<&Value>) -> Result<T, StatsError> {
        let info = self
            .get(key)
            .ok_or_else(|| StatsError::UnknownScreener(key.to_string()))?;

        let mut value = info.default_config.clone();
        if let (Value::Object(base), Some(Value::Object(extra))) = (&mut value, overrides) {
            for (field, v) in extra {
                base.insert(field.clone(), v.clone());
            }
        }

        let config: T = serde_json::from_value(value)
            .map_err(|e| StatsError::InvalidParameter(format!("{}: {}", key, e)))?;
        config.validate()?;
        Ok(config)
    }
}

impl Default for ScreenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
