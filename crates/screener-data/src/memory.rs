//! In-memory data source for offline runs and tests.

use async_trait::async_trait;
use chrono::NaiveDate;
use screener_core::error::DataError;
use screener_core::traits::{MarketDataSource, ScreenerQuery};
use screener_core::types::{
    AnalystGrade, CompanyOutlook, Dividend, EarningsEstimate, FinancialRatios, IncomeGrowth,
    IncomeStatement, InstitutionalOwnership, NewsArticle, PriceHistory, PriceTarget,
    ReportingPeriod, SocialSentiment, StockListing,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

type BySymbol<T> = HashMap<String, Vec<T>>;
type ByPeriod<T> = HashMap<(String, ReportingPeriod), Vec<T>>;

/// A [`MarketDataSource`] over preloaded records.
///
/// Symbols without data return empty lists, like the provider does.
#[derive(Debug, Default)]
pub struct InMemorySource {
    listings: Vec<StockListing>,
    prices: HashMap<String, PriceHistory>,
    grades: BySymbol<AnalystGrade>,
    growth: ByPeriod<IncomeGrowth>,
    ratios: ByPeriod<FinancialRatios>,
    social: BySymbol<SocialSentiment>,
    news: BySymbol<NewsArticle>,
    dividends: BySymbol<Dividend>,
    targets: BySymbol<PriceTarget>,
    estimates: ByPeriod<EarningsEstimate>,
    ownership: BySymbol<InstitutionalOwnership>,
    income: ByPeriod<IncomeStatement>,
    outlooks: HashMap<String, CompanyOutlook>,
    calls: AtomicUsize,
}

impl InMemorySource {
    /// Create an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listings(mut self, listings: Vec<StockListing>) -> Self {
        self.listings = listings;
        self
    }

    pub fn with_prices(mut self, history: PriceHistory) -> Self {
        self.prices.insert(history.symbol.clone(), history);
        self
    }

    pub fn with_grades(mut self, symbol: &str, grades: Vec<AnalystGrade>) -> Self {
        self.grades.insert(symbol.to_string(), grades);
        self
    }

    pub fn with_income_growth(
        mut self,
        symbol: &str,
        period: ReportingPeriod,
        rows: Vec<IncomeGrowth>,
    ) -> Self {
        self.growth.insert((symbol.to_string(), period), rows);
        self
    }

    pub fn with_ratios(
        mut self,
        symbol: &str,
        period: ReportingPeriod,
        rows: Vec<FinancialRatios>,
    ) -> Self {
        self.ratios.insert((symbol.to_string(), period), rows);
        self
    }

    pub fn with_social_sentiment(mut self, symbol: &str, rows: Vec<SocialSentiment>) -> Self {
        self.social.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_news(mut self, symbol: &str, articles: Vec<NewsArticle>) -> Self {
        self.news.insert(symbol.to_string(), articles);
        self
    }

    pub fn with_dividends(mut self, symbol: &str, rows: Vec<Dividend>) -> Self {
        self.dividends.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_price_targets(mut self, symbol: &str, rows: Vec<PriceTarget>) -> Self {
        self.targets.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_estimates(
        mut self,
        symbol: &str,
        period: ReportingPeriod,
        rows: Vec<EarningsEstimate>,
    ) -> Self {
        self.estimates.insert((symbol.to_string(), period), rows);
        self
    }

    pub fn with_ownership(mut self, symbol: &str, rows: Vec<InstitutionalOwnership>) -> Self {
        self.ownership.insert(symbol.to_string(), rows);
        self
    }

    pub fn with_income_statements(
        mut self,
        symbol: &str,
        period: ReportingPeriod,
        rows: Vec<IncomeStatement>,
    ) -> Self {
        self.income.insert((symbol.to_string(), period), rows);
        self
    }

    pub fn with_outlook(mut self, symbol: &str, outlook: CompanyOutlook) -> Self {
        self.outlooks.insert(symbol.to_string(), outlook);
        self
    }

    /// Number of trait calls served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    fn hit(&self) {
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    fn by_symbol<T: Clone>(map: &BySymbol<T>, symbol: &str) -> Vec<T> {
        map.get(symbol).cloned().unwrap_or_default()
    }

    fn by_period<T: Clone>(map: &ByPeriod<T>, symbol: &str, period: ReportingPeriod) -> Vec<T> {
        map.get(&(symbol.to_string(), period))
            .cloned()
            .unwrap_or_default()
    }
}

fn matches_query(listing: &StockListing, query: &ScreenerQuery) -> bool {
    let above = |value: Option<f64>, bound: Option<f64>| match bound {
        Some(b) => value.is_some_and(|v| v > b),
        None => true,
    };
    let below = |value: Option<f64>, bound: Option<f64>| match bound {
        Some(b) => value.is_some_and(|v| v < b),
        None => true,
    };
    let same = |value: &Option<String>, wanted: &Option<String>| match wanted {
        Some(w) => value.as_deref().is_some_and(|v| v.eq_ignore_ascii_case(w)),
        None => true,
    };

    above(listing.market_cap, query.market_cap_more_than)
        && below(listing.market_cap, query.market_cap_lower_than)
        && above(listing.price, query.price_more_than)
        && below(listing.price, query.price_lower_than)
        && below(listing.beta, query.beta_lower_than)
        && above(listing.volume, query.volume_more_than)
        && same(&listing.sector, &query.sector)
        && same(&listing.industry, &query.industry)
}

#[async_trait]
impl MarketDataSource for InMemorySource {
    async fn stock_screener(&self, query: &ScreenerQuery) -> Result<Vec<StockListing>, DataError> {
        self.hit();
        Ok(self
            .listings
            .iter()
            .filter(|l| matches_query(l, query))
            .take(query.limit)
            .cloned()
            .collect())
    }

    async fn tradable_symbols(&self) -> Result<Vec<StockListing>, DataError> {
        self.hit();
        Ok(self.listings.clone())
    }

    async fn daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, DataError> {
        self.hit();
        Ok(self
            .prices
            .get(symbol)
            .map(|h| h.between(start, end))
            .unwrap_or_else(|| PriceHistory::new(symbol, Vec::new())))
    }

    async fn analyst_grades(&self, symbol: &str) -> Result<Vec<AnalystGrade>, DataError> {
        self.hit();
        Ok(Self::by_symbol(&self.grades, symbol))
    }

    async fn income_growth(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeGrowth>, DataError> {
        self.hit();
        Ok(Self::by_period(&self.growth, symbol, period))
    }

    async fn financial_ratios(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<FinancialRatios>, DataError> {
        self.hit();
        Ok(Self::by_period(&self.ratios, symbol, period))
    }

    async fn social_sentiment(&self, symbol: &str) -> Result<Vec<SocialSentiment>, DataError> {
        self.hit();
        Ok(Self::by_symbol(&self.social, symbol))
    }

    async fn stock_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, DataError> {
        self.hit();
        let mut news = Self::by_symbol(&self.news, symbol);
        news.truncate(limit);
        Ok(news)
    }

    async fn dividends(&self, symbol: &str) -> Result<Vec<Dividend>, DataError> {
        self.hit();
        Ok(Self::by_symbol(&self.dividends, symbol))
    }

    async fn price_targets(&self, symbol: &str) -> Result<Vec<PriceTarget>, DataError> {
        self.hit();
        Ok(Self::by_symbol(&self.targets, symbol))
    }

    async fn analyst_estimates(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<EarningsEstimate>, DataError> {
        self.hit();
        Ok(Self::by_period(&self.estimates, symbol, period))
    }

    async fn institutional_ownership(
        &self,
        symbol: &str,
    ) -> Result<Vec<InstitutionalOwnership>, DataError> {
        self.hit();
        Ok(Self::by_symbol(&self.ownership, symbol))
    }

    async fn income_statements(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeStatement>, DataError> {
        self.hit();
        Ok(Self::by_period(&self.income, symbol, period))
    }

    async fn company_outlook(&self, symbol: &str) -> Result<Option<CompanyOutlook>, DataError> {
        self.hit();
        Ok(self.outlooks.get(symbol).cloned())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
