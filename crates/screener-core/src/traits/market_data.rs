//! Market data source trait definitions.

use crate::error::DataError;
use crate::types::{
    AnalystGrade, CompanyOutlook, Dividend, EarningsEstimate, FinancialRatios, IncomeGrowth,
    IncomeStatement, InstitutionalOwnership, NewsArticle, PriceHistory, PriceTarget,
    ReportingPeriod, SocialSentiment, StockListing,
};
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Parameters of the provider's stock screener.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenerQuery {
    /// Exchanges to include (e.g. `nyse`, `nasdaq`, `amex`)
    pub exchanges: Vec<String>,
    pub market_cap_more_than: Option<f64>,
    pub market_cap_lower_than: Option<f64>,
    pub price_more_than: Option<f64>,
    pub price_lower_than: Option<f64>,
    pub beta_lower_than: Option<f64>,
    pub volume_more_than: Option<f64>,
    pub country: Option<String>,
    pub sector: Option<String>,
    pub industry: Option<String>,
    pub is_etf: bool,
    pub is_fund: bool,
    pub is_actively_trading: bool,
    pub limit: usize,
}

impl Default for ScreenerQuery {
    fn default() -> Self {
        Self {
            exchanges: vec!["nyse".to_string(), "nasdaq".to_string(), "amex".to_string()],
            market_cap_more_than: None,
            market_cap_lower_than: None,
            price_more_than: None,
            price_lower_than: None,
            beta_lower_than: None,
            volume_more_than: None,
            country: Some("US".to_string()),
            sector: None,
            industry: None,
            is_etf: false,
            is_fund: false,
            is_actively_trading: true,
            limit: 3000,
        }
    }
}

impl ScreenerQuery {
    /// Stable key identifying this query in the cache.
    pub fn cache_key(&self) -> String {
        let fmt = |v: Option<f64>| v.map(|x| x.to_string()).unwrap_or_else(|| "any".to_string());
        format!(
            "{}_{}_{}_{}_{}_{}_{}_{}_{}_{}",
            self.exchanges.join("-"),
            fmt(self.market_cap_more_than),
            fmt(self.market_cap_lower_than),
            fmt(self.price_more_than),
            fmt(self.price_lower_than),
            fmt(self.beta_lower_than),
            fmt(self.volume_more_than),
            self.country.as_deref().unwrap_or("any"),
            self.industry.as_deref().unwrap_or("any"),
            self.limit
        )
        .replace([' ', '/', '&'], "-")
    }
}

/// Trait for market and fundamental data sources.
///
/// Every list-returning method yields an empty vector when the provider has
/// no data for the symbol; errors are reserved for transport and parse
/// failures.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Run the provider's stock screener.
    async fn stock_screener(&self, query: &ScreenerQuery) -> Result<Vec<StockListing>, DataError>;

    /// List every tradable symbol.
    async fn tradable_symbols(&self) -> Result<Vec<StockListing>, DataError>;

    /// Fetch daily prices.
    ///
    /// # Arguments
    /// * `symbol` - The symbol to fetch
    /// * `start` - First day of the range (inclusive)
    /// * `end` - Last day of the range (inclusive)
    ///
    /// # Returns
    /// Price history ordered from oldest to newest
    async fn daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, DataError>;

    /// Fetch analyst grade changes, newest first.
    async fn analyst_grades(&self, symbol: &str) -> Result<Vec<AnalystGrade>, DataError>;

    /// Fetch income statement growth rates.
    async fn income_growth(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeGrowth>, DataError>;

    /// Fetch financial ratios, newest first.
    async fn financial_ratios(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<FinancialRatios>, DataError>;

    /// Fetch historical social media sentiment.
    async fn social_sentiment(&self, symbol: &str) -> Result<Vec<SocialSentiment>, DataError>;

    /// Fetch recent news articles.
    async fn stock_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, DataError>;

    /// Fetch dividend history.
    async fn dividends(&self, symbol: &str) -> Result<Vec<Dividend>, DataError>;

    /// Fetch published price targets.
    async fn price_targets(&self, symbol: &str) -> Result<Vec<PriceTarget>, DataError>;

    /// Fetch consensus analyst estimates.
    async fn analyst_estimates(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<EarningsEstimate>, DataError>;

    /// Fetch institutional ownership summaries, newest first.
    async fn institutional_ownership(
        &self,
        symbol: &str,
    ) -> Result<Vec<InstitutionalOwnership>, DataError>;

    /// Fetch income statements.
    async fn income_statements(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeStatement>, DataError>;

    /// Fetch the company outlook snapshot.
    async fn company_outlook(&self, symbol: &str) -> Result<Option<CompanyOutlook>, DataError>;

    /// Get the data source name.
    fn name(&self) -> &str;
}
