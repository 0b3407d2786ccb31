//! Shared state of a finder run.

use chrono::{Duration, NaiveDate};
use screener_config::AppConfig;
use screener_core::error::{DataError, FinderError, ScreenerError};
use screener_core::traits::{
    MarketDataSource, ScreenerQuery, Sentiment, SentimentClassifier, TextGenerator,
};
use screener_core::types::{
    AnalystGrade, CompanyOutlook, Dividend, EarningsEstimate, FinancialRatios, IncomeGrowth,
    IncomeStatement, InstitutionalOwnership, NewsArticle, PriceHistory, PriceTarget,
    ReportingPeriod, ScoreTable, SocialSentiment, StockListing,
};
use screener_data::{symbols_of, ArticleFetcher, IndexConstituentsLoader, MarketIndex, UniverseSelector};
use screener_report::{write_table_csv, CompanyReportGenerator};
use screener_screens::{BySymbol, NEWS_ARTICLE_LIMIT};
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Everything a finder needs: data, optional language models, settings
/// and the date the run is evaluated at.
pub struct FinderContext {
    source: Arc<dyn MarketDataSource>,
    generator: Option<Arc<dyn TextGenerator>>,
    classifier: Option<Arc<dyn SentimentClassifier>>,
    index_loader: Option<IndexConstituentsLoader>,
    articles: Option<ArticleFetcher>,
    config: AppConfig,
    as_of: NaiveDate,
}

impl FinderContext {
    /// Create a context without language models or index loader.
    pub fn new(source: Arc<dyn MarketDataSource>, config: AppConfig, as_of: NaiveDate) -> Self {
        Self {
            source,
            generator: None,
            classifier: None,
            index_loader: None,
            articles: None,
            config,
            as_of,
        }
    }

    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn SentimentClassifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    /// Resolve index universes from constituent tables.
    ///
    /// Without a loader, index universes fall back to the provider's
    /// tradable symbol list.
    pub fn with_index_loader(mut self, loader: IndexConstituentsLoader) -> Self {
        self.index_loader = Some(loader);
        self
    }

    /// Download article bodies for news items that come without text.
    pub fn with_article_fetcher(mut self, fetcher: ArticleFetcher) -> Self {
        self.articles = Some(fetcher);
        self
    }

    pub fn source(&self) -> &Arc<dyn MarketDataSource> {
        &self.source
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// Language model for candidate ranking, if enabled in the settings.
    pub fn ranking_generator(&self) -> Option<&Arc<dyn TextGenerator>> {
        let ai = &self.config.ai;
        if ai.enabled && ai.rank_candidates {
            self.generator.as_ref()
        } else {
            None
        }
    }

    /// Symbols from the provider screener, narrowed by industry.
    ///
    /// # Errors
    /// `FinderError::EmptyUniverse` when nothing is left.
    pub async fn screener_universe(
        &self,
        query: ScreenerQuery,
        include_industries: Vec<String>,
        exclude_industries: Vec<String>,
    ) -> Result<Vec<String>, ScreenerError> {
        let selector = UniverseSelector::new(query)?
            .include_industries(include_industries)
            .exclude_industries(exclude_industries);
        let listings = selector.select(self.source.as_ref()).await?;
        non_empty(symbols_of(&listings))
    }

    /// Union of index constituents, first-seen order.
    pub async fn index_universe(&self, indexes: &[MarketIndex]) -> Result<Vec<String>, ScreenerError> {
        let listings: Vec<StockListing> = match &self.index_loader {
            Some(loader) => loader.load_union(indexes).await,
            None => {
                debug!("No index loader, using tradable symbols");
                self.source.tradable_symbols().await?
            }
        };
        let listings = UniverseSelector::new(ScreenerQuery::default())?.filter(listings);
        info!(indexes = indexes.len(), symbols = listings.len(), "Index universe loaded");
        non_empty(symbols_of(&listings))
    }

    /// Daily prices over the last `days` calendar days; empty histories are dropped.
    pub async fn prices(&self, symbols: &[String], days: i64) -> BySymbol<PriceHistory> {
        let start = self.as_of - Duration::days(days);
        let end = self.as_of;
        let mut prices = self
            .collect(symbols, "daily prices", move |source, symbol| async move {
                source.daily_prices(&symbol, start, end).await
            })
            .await;
        prices.retain(|symbol, history| {
            if history.is_empty() {
                debug!(symbol = %symbol, "No price data");
            }
            !history.is_empty()
        });
        prices
    }

    pub async fn grades(&self, symbols: &[String]) -> BySymbol<Vec<AnalystGrade>> {
        self.collect(symbols, "analyst grades", |source, symbol| async move {
            source.analyst_grades(&symbol).await
        })
        .await
    }

    pub async fn income_growth(
        &self,
        symbols: &[String],
        period: ReportingPeriod,
    ) -> BySymbol<Vec<IncomeGrowth>> {
        self.collect(symbols, "income growth", move |source, symbol| async move {
            source.income_growth(&symbol, period).await
        })
        .await
    }

    pub async fn ratios(
        &self,
        symbols: &[String],
        period: ReportingPeriod,
    ) -> BySymbol<Vec<FinancialRatios>> {
        self.collect(symbols, "financial ratios", move |source, symbol| async move {
            source.financial_ratios(&symbol, period).await
        })
        .await
    }

    pub async fn social_sentiment(&self, symbols: &[String]) -> BySymbol<Vec<SocialSentiment>> {
        self.collect(symbols, "social sentiment", |source, symbol| async move {
            source.social_sentiment(&symbol).await
        })
        .await
    }

    pub async fn dividends(&self, symbols: &[String]) -> BySymbol<Vec<Dividend>> {
        self.collect(symbols, "dividends", |source, symbol| async move {
            source.dividends(&symbol).await
        })
        .await
    }

    pub async fn price_targets(&self, symbols: &[String]) -> BySymbol<Vec<PriceTarget>> {
        self.collect(symbols, "price targets", |source, symbol| async move {
            source.price_targets(&symbol).await
        })
        .await
    }

    pub async fn estimates(
        &self,
        symbols: &[String],
        period: ReportingPeriod,
    ) -> BySymbol<Vec<EarningsEstimate>> {
        self.collect(symbols, "analyst estimates", move |source, symbol| async move {
            source.analyst_estimates(&symbol, period).await
        })
        .await
    }

    pub async fn ownership(&self, symbols: &[String]) -> BySymbol<Vec<InstitutionalOwnership>> {
        self.collect(symbols, "institutional ownership", |source, symbol| async move {
            source.institutional_ownership(&symbol).await
        })
        .await
    }

    pub async fn income_statements(
        &self,
        symbols: &[String],
        period: ReportingPeriod,
    ) -> BySymbol<Vec<IncomeStatement>> {
        self.collect(symbols, "income statements", move |source, symbol| async move {
            source.income_statements(&symbol, period).await
        })
        .await
    }

    /// Company outlooks; symbols the provider has no outlook for are left out.
    pub async fn outlooks(&self, symbols: &[String]) -> BySymbol<CompanyOutlook> {
        self.collect(symbols, "company outlook", |source, symbol| async move {
            source.company_outlook(&symbol).await
        })
        .await
        .into_iter()
        .filter_map(|(symbol, outlook)| outlook.map(|o| (symbol, o)))
        .collect()
    }

    /// Classify the latest news of each symbol.
    ///
    /// Returns an empty map when no classifier is configured or news
    /// classification is switched off; those symbols then score zero.
    pub async fn classified_news(&self, symbols: &[String]) -> BySymbol<Vec<Sentiment>> {
        let mut classified = BySymbol::new();
        let Some(classifier) = self.classifier.as_ref().filter(|_| self.config.ai.classify_news) else {
            debug!("News classification disabled");
            return classified;
        };

        let news = self
            .collect(symbols, "stock news", |source, symbol| async move {
                source.stock_news(&symbol, NEWS_ARTICLE_LIMIT).await
            })
            .await;

        for (symbol, articles) in news {
            let mut results = Vec::with_capacity(articles.len());
            for article in &articles {
                let text = self.article_text(article).await;
                match classifier.classify(&text).await {
                    Ok(sentiment) => results.push(sentiment),
                    Err(e) => warn!(symbol = %symbol, error = %e, "Failed to classify article"),
                }
            }
            classified.insert(symbol, results);
        }
        classified
    }

    /// Title followed by the fetched article body, or the provider
    /// snippet when the page yields nothing.
    async fn article_text(&self, article: &NewsArticle) -> String {
        let mut body = String::new();
        if let Some(fetcher) = self.articles.as_ref().filter(|_| !article.url.is_empty()) {
            body = fetcher.fetch_text(&article.url).await;
        }
        if body.trim().is_empty() {
            body = article.text.trim().to_string();
        }
        if body.is_empty() {
            return article.title.clone();
        }
        format!("{} {}", article.title, body)
    }

    /// Fetch one record set per symbol; failures are logged and skipped.
    async fn collect<T, F, Fut>(&self, symbols: &[String], what: &str, fetch: F) -> BySymbol<T>
    where
        F: Fn(Arc<dyn MarketDataSource>, String) -> Fut,
        Fut: Future<Output = Result<T, DataError>>,
    {
        let mut results = BySymbol::new();
        for symbol in symbols {
            match fetch(Arc::clone(&self.source), symbol.clone()).await {
                Ok(value) => {
                    results.insert(symbol.clone(), value);
                }
                Err(e) => warn!(symbol = %symbol, what, error = %e, "Fetch failed, skipping symbol"),
            }
        }
        debug!(what, requested = symbols.len(), fetched = results.len(), "Collected");
        results
    }

    /// Path of a result file.
    pub fn results_path(&self, file_name: &str) -> PathBuf {
        self.config.paths.results_dir.join(file_name)
    }

    /// Write a result table as CSV and return its path.
    pub fn write_results(&self, file_name: &str, table: &ScoreTable) -> Result<PathBuf, ScreenerError> {
        let path = self.results_path(file_name);
        write_table_csv(&path, table)?;
        info!(path = %path.display(), rows = table.len(), "Results written");
        Ok(path)
    }

    /// Company report generator writing under `<reports_dir>/<subdir>`.
    pub fn report_generator(&self, subdir: &str) -> Result<CompanyReportGenerator, ScreenerError> {
        let dir = self.config.paths.reports_dir.join(subdir);
        let mut generator = CompanyReportGenerator::new(Arc::clone(&self.source), dir, self.as_of)?;
        if self.config.ai.enabled {
            if let Some(llm) = &self.generator {
                generator = generator.with_generator(Arc::clone(llm), self.config.ai.max_prompt_tokens);
            }
        }
        Ok(generator)
    }
}

fn non_empty(symbols: Vec<String>) -> Result<Vec<String>, ScreenerError> {
    if symbols.is_empty() {
        return Err(FinderError::EmptyUniverse.into());
    }
    Ok(symbols)
}
