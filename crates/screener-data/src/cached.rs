//! Caching decorator for market data sources.

use async_trait::async_trait;
use chrono::NaiveDate;
use screener_core::error::DataError;
use screener_core::traits::{MarketDataSource, ScreenerQuery};
use screener_core::types::{
    AnalystGrade, CompanyOutlook, Dividend, EarningsEstimate, FinancialRatios, IncomeGrowth,
    IncomeStatement, InstitutionalOwnership, NewsArticle, PriceHistory, PriceTarget,
    RefreshInterval, ReportingPeriod, SocialSentiment, StockListing,
};
use serde::{Deserialize, Serialize};

use crate::cache::FileCache;

/// Refresh interval per data class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheIntervals {
    /// Screener results and tradable symbol lists
    pub stock_list: RefreshInterval,
    /// Daily prices
    pub prices: RefreshInterval,
    /// Analyst grades, price targets and estimates
    pub analyst_ratings: RefreshInterval,
    /// Statements, ratios, ownership, dividends, news and sentiment
    pub fundamentals: RefreshInterval,
}

impl Default for CacheIntervals {
    fn default() -> Self {
        Self {
            stock_list: RefreshInterval::Weekly,
            prices: RefreshInterval::Daily,
            analyst_ratings: RefreshInterval::Weekly,
            fundamentals: RefreshInterval::Weekly,
        }
    }
}

/// Wraps a [`MarketDataSource`] and caches every endpoint on disk.
pub struct CachedSource<S> {
    inner: S,
    cache: FileCache,
    intervals: CacheIntervals,
}

impl<S: MarketDataSource> CachedSource<S> {
    /// Wrap `inner` with the default intervals.
    pub fn new(inner: S, cache: FileCache) -> Self {
        Self {
            inner,
            cache,
            intervals: CacheIntervals::default(),
        }
    }

    /// Override the refresh intervals.
    pub fn with_intervals(mut self, intervals: CacheIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    /// Get the wrapped source.
    pub fn inner(&self) -> &S {
        &self.inner
    }

    /// Get the underlying cache.
    pub fn cache(&self) -> &FileCache {
        &self.cache
    }
}

#[async_trait]
impl<S: MarketDataSource> MarketDataSource for CachedSource<S> {
    async fn stock_screener(&self, query: &ScreenerQuery) -> Result<Vec<StockListing>, DataError> {
        self.cache
            .get_or_fetch("stock_screener", &query.cache_key(), self.intervals.stock_list, || {
                self.inner.stock_screener(query)
            })
            .await
    }

    async fn tradable_symbols(&self) -> Result<Vec<StockListing>, DataError> {
        self.cache
            .get_or_fetch("tradable_symbols", "all", self.intervals.stock_list, || {
                self.inner.tradable_symbols()
            })
            .await
    }

    async fn daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, DataError> {
        // Keyed by window length so each day's fetch replaces the last one.
        let key = format!("{}_{}d", symbol, (end - start).num_days());
        self.cache
            .get_or_fetch("prices", &key, self.intervals.prices, || {
                self.inner.daily_prices(symbol, start, end)
            })
            .await
    }

    async fn analyst_grades(&self, symbol: &str) -> Result<Vec<AnalystGrade>, DataError> {
        self.cache
            .get_or_fetch("analyst_grades", symbol, self.intervals.analyst_ratings, || {
                self.inner.analyst_grades(symbol)
            })
            .await
    }

    async fn income_growth(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeGrowth>, DataError> {
        let key = format!("{}_{}", symbol, period);
        self.cache
            .get_or_fetch("income_growth", &key, self.intervals.fundamentals, || {
                self.inner.income_growth(symbol, period)
            })
            .await
    }

    async fn financial_ratios(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<FinancialRatios>, DataError> {
        let key = format!("{}_{}", symbol, period);
        self.cache
            .get_or_fetch("ratios", &key, self.intervals.fundamentals, || {
                self.inner.financial_ratios(symbol, period)
            })
            .await
    }

    async fn social_sentiment(&self, symbol: &str) -> Result<Vec<SocialSentiment>, DataError> {
        self.cache
            .get_or_fetch("social_sentiment", symbol, self.intervals.fundamentals, || {
                self.inner.social_sentiment(symbol)
            })
            .await
    }

    async fn stock_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, DataError> {
        let key = format!("{}_{}", symbol, limit);
        self.cache
            .get_or_fetch("news", &key, self.intervals.fundamentals, || {
                self.inner.stock_news(symbol, limit)
            })
            .await
    }

    async fn dividends(&self, symbol: &str) -> Result<Vec<Dividend>, DataError> {
        self.cache
            .get_or_fetch("dividends", symbol, self.intervals.fundamentals, || {
                self.inner.dividends(symbol)
            })
            .await
    }

    async fn price_targets(&self, symbol: &str) -> Result<Vec<PriceTarget>, DataError> {
        self.cache
            .get_or_fetch("price_targets", symbol, self.intervals.analyst_ratings, || {
                self.inner.price_targets(symbol)
            })
            .await
    }

    async fn analyst_estimates(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<EarningsEstimate>, DataError> {
        let key = format!("{}_{}", symbol, period);
        self.cache
            .get_or_fetch("analyst_estimates", &key, self.intervals.analyst_ratings, || {
                self.inner.analyst_estimates(symbol, period)
            })
            .await
    }

    async fn institutional_ownership(
        &self,
        symbol: &str,
    ) -> Result<Vec<InstitutionalOwnership>, DataError> {
        self.cache
            .get_or_fetch("institutional_ownership", symbol, self.intervals.fundamentals, || {
                self.inner.institutional_ownership(symbol)
            })
            .await
    }

    async fn income_statements(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeStatement>, DataError> {
        let key = format!("{}_{}", symbol, period);
        self.cache
            .get_or_fetch("income_statements", &key, self.intervals.fundamentals, || {
                self.inner.income_statements(symbol, period)
            })
            .await
    }

    async fn company_outlook(&self, symbol: &str) -> Result<Option<CompanyOutlook>, DataError> {
        self.cache
            .get_or_fetch("company_outlook", symbol, self.intervals.fundamentals, || {
                self.inner.company_outlook(symbol)
            })
            .await
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;
    use screener_core::types::Bar;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_second_call_served_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let inner = InMemorySource::new()
            .with_grades("AAPL", vec![AnalystGrade::new(day(2024, 3, 1), "Buy")]);
        let cache = FileCache::new(dir.path()).with_today(day(2024, 3, 14));
        let source = CachedSource::new(inner, cache);

        let first = source.analyst_grades("AAPL").await.unwrap();
        let second = source.analyst_grades("AAPL").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(source.inner().calls(), 1);
        assert!(dir.path().join("analyst_grades/AAPL_2024-03-11.json").exists());
    }

    #[tokio::test]
    async fn test_price_window_keeps_one_file() {
        let dir = tempfile::tempdir().unwrap();
        let bars = vec![Bar::close_only(day(2023, 12, 29), 10.0), Bar::close_only(day(2024, 1, 2), 11.0)];
        let inner = InMemorySource::new().with_prices(PriceHistory::new("AAA", bars));

        let monday = CachedSource::new(inner, FileCache::new(dir.path()).with_today(day(2024, 1, 1)));
        monday
            .daily_prices("AAA", day(2021, 1, 1), day(2024, 1, 1))
            .await
            .unwrap();

        let tuesday = CachedSource::new(
            InMemorySource::new(),
            FileCache::new(dir.path()).with_today(day(2024, 1, 2)),
        );
        tuesday
            .daily_prices("AAA", day(2021, 1, 2), day(2024, 1, 2))
            .await
            .unwrap();

        let files: Vec<_> = std::fs::read_dir(dir.path().join("prices"))
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(files, vec!["AAA_1095d_2024-01-02.json".to_string()]);
    }

    #[tokio::test]
    async fn test_periods_are_cached_separately() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path()).with_today(day(2024, 3, 14));
        let source = CachedSource::new(InMemorySource::new(), cache);

        source.income_growth("AAPL", ReportingPeriod::Annual).await.unwrap();
        source.income_growth("AAPL", ReportingPeriod::Quarter).await.unwrap();
        source.income_growth("AAPL", ReportingPeriod::Quarter).await.unwrap();

        assert_eq!(source.inner().calls(), 2);
        assert_eq!(source.name(), "memory");
    }
}
