//! Universe selection: the symbols a finder starts from.

use regex::Regex;
use screener_core::error::DataError;
use screener_core::traits::{MarketDataSource, ScreenerQuery};
use screener_core::types::StockListing;
use std::collections::HashSet;
use tracing::info;

/// Symbols listed on a foreign exchange carry a `.XX` suffix.
const FOREIGN_SUFFIX_PATTERN: &str = r"\.\w{1,4}$";

/// Runs the provider screener and narrows the result to a tradable universe.
#[derive(Debug, Clone)]
pub struct UniverseSelector {
    query: ScreenerQuery,
    include_industries: Vec<String>,
    exclude_industries: Vec<String>,
    foreign_suffix: Regex,
}

impl UniverseSelector {
    /// Create a selector around a screener query.
    pub fn new(query: ScreenerQuery) -> Result<Self, DataError> {
        let foreign_suffix = Regex::new(FOREIGN_SUFFIX_PATTERN)
            .map_err(|e| DataError::Internal(e.to_string()))?;
        Ok(Self {
            query,
            include_industries: Vec::new(),
            exclude_industries: Vec::new(),
            foreign_suffix,
        })
    }

    /// Keep only listings in these industries.
    pub fn include_industries(mut self, industries: Vec<String>) -> Self {
        self.include_industries = industries;
        self
    }

    /// Drop listings in these industries.
    pub fn exclude_industries(mut self, industries: Vec<String>) -> Self {
        self.exclude_industries = industries;
        self
    }

    /// Get the screener query.
    pub fn query(&self) -> &ScreenerQuery {
        &self.query
    }

    /// Run the screener and filter its output.
    pub async fn select(&self, source: &dyn MarketDataSource) -> Result<Vec<StockListing>, DataError> {
        let listings = source.stock_screener(&self.query).await?;
        let total = listings.len();
        let selected = self.filter(listings);
        info!(total, selected = selected.len(), "Universe selected");
        Ok(selected)
    }

    /// Apply the suffix and industry filters, dropping duplicate symbols.
    pub fn filter(&self, listings: Vec<StockListing>) -> Vec<StockListing> {
        let mut seen = HashSet::new();
        listings
            .into_iter()
            .filter(|l| !self.foreign_suffix.is_match(&l.symbol))
            .filter(|l| self.industry_allowed(l.industry.as_deref()))
            .filter(|l| seen.insert(l.symbol.clone()))
            .collect()
    }

    fn industry_allowed(&self, industry: Option<&str>) -> bool {
        let listed = |list: &[String]| {
            industry.is_some_and(|i| list.iter().any(|x| x.eq_ignore_ascii_case(i)))
        };
        if !self.include_industries.is_empty() && !listed(&self.include_industries) {
            return false;
        }
        !listed(&self.exclude_industries)
    }
}

/// Symbols of a list of listings.
pub fn symbols_of(listings: &[StockListing]) -> Vec<String> {
    listings.iter().map(|l| l.symbol.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemorySource;

    fn listings() -> Vec<StockListing> {
        vec![
            StockListing::new("AAPL").with_industry("Consumer Electronics"),
            StockListing::new("SHOP.TO").with_industry("Software"),
            StockListing::new("BRK-B").with_industry("Insurance"),
            StockListing::new("MRNA").with_industry("Biotechnology"),
            StockListing::new("AAPL").with_industry("Consumer Electronics"),
            StockListing::new("NOIND"),
        ]
    }

    #[test]
    fn test_drops_foreign_suffix_and_duplicates() {
        let selector = UniverseSelector::new(ScreenerQuery::default()).unwrap();
        let symbols = symbols_of(&selector.filter(listings()));
        assert_eq!(symbols, vec!["AAPL", "BRK-B", "MRNA", "NOIND"]);
    }

    #[test]
    fn test_industry_filters() {
        let include = UniverseSelector::new(ScreenerQuery::default())
            .unwrap()
            .include_industries(vec!["biotechnology".to_string()]);
        assert_eq!(symbols_of(&include.filter(listings())), vec!["MRNA"]);

        let exclude = UniverseSelector::new(ScreenerQuery::default())
            .unwrap()
            .exclude_industries(vec!["Biotechnology".to_string()]);
        assert_eq!(
            symbols_of(&exclude.filter(listings())),
            vec!["AAPL", "BRK-B", "NOIND"]
        );
    }

    #[tokio::test]
    async fn test_select_from_source() {
        let source = InMemorySource::new().with_listings(listings());
        let selector = UniverseSelector::new(ScreenerQuery::default()).unwrap();
        let selected = selector.select(&source).await.unwrap();
        assert_eq!(selected.len(), 4);
    }
}
