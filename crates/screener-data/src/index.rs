//! Market index constituents scraped from Wikipedia tables.

use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use screener_core::error::DataError;
use screener_core::types::{RefreshInterval, StockListing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use tracing::{info, warn};

use crate::cache::FileCache;

const WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org/wiki";

/// Market indexes with a constituents table on Wikipedia.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarketIndex {
    Nasdaq100,
    Sp500,
    DowJones,
    Russell1000,
    Russell2000,
}

impl MarketIndex {
    /// All supported indexes.
    pub const ALL: [MarketIndex; 5] = [
        MarketIndex::Nasdaq100,
        MarketIndex::Sp500,
        MarketIndex::DowJones,
        MarketIndex::Russell1000,
        MarketIndex::Russell2000,
    ];

    /// Wikipedia page holding the constituents table.
    pub fn page(&self) -> &'static str {
        match self {
            MarketIndex::Nasdaq100 => "Nasdaq-100",
            MarketIndex::Sp500 => "List_of_S%26P_500_companies",
            MarketIndex::DowJones => "Dow_Jones_Industrial_Average",
            MarketIndex::Russell1000 => "Russell_1000_Index",
            MarketIndex::Russell2000 => "Russell_2000_Index",
        }
    }

    /// Position of the constituents table among the page's tables.
    pub fn table_index(&self) -> usize {
        match self {
            MarketIndex::Nasdaq100 => 4,
            MarketIndex::Sp500 => 0,
            MarketIndex::DowJones => 1,
            MarketIndex::Russell1000 | MarketIndex::Russell2000 => 2,
        }
    }

    /// Header of the ticker column.
    pub fn ticker_column(&self) -> &'static str {
        match self {
            MarketIndex::Nasdaq100 => "Ticker",
            _ => "Symbol",
        }
    }
}

impl fmt::Display for MarketIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MarketIndex::Nasdaq100 => "nasdaq100",
            MarketIndex::Sp500 => "sp500",
            MarketIndex::DowJones => "dji",
            MarketIndex::Russell1000 => "russell1000",
            MarketIndex::Russell2000 => "russell2000",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for MarketIndex {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(['-', '_', ' ', '&'], "").as_str() {
            "nasdaq100" | "ndx" => Ok(MarketIndex::Nasdaq100),
            "sp500" | "snp500" | "spx" => Ok(MarketIndex::Sp500),
            "dji" | "dowjones" | "dow" => Ok(MarketIndex::DowJones),
            "russell1000" => Ok(MarketIndex::Russell1000),
            "russell2000" => Ok(MarketIndex::Russell2000),
            _ => Err(format!("Unknown market index: {}", s)),
        }
    }
}

fn selector(css: &str) -> Result<Selector, DataError> {
    Selector::parse(css).map_err(|e| DataError::ParseError(format!("Invalid selector {}: {:?}", css, e)))
}

fn cell_text(cell: ElementRef<'_>) -> String {
    cell.text().collect::<Vec<_>>().join(" ").split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Extract constituents from the `table_index`-th table of an HTML page.
///
/// The ticker column is located by its header text. A company column
/// (`Company`, `Security` or `Name`) is picked up when present.
pub fn parse_constituents(
    html: &str,
    table_index: usize,
    ticker_column: &str,
) -> Result<Vec<StockListing>, DataError> {
    let document = Html::parse_document(html);
    let table_sel = selector("table")?;
    let row_sel = selector("tr")?;
    let cell_sel = selector("th, td")?;

    let table = document
        .select(&table_sel)
        .nth(table_index)
        .ok_or_else(|| DataError::ParseError(format!("Table {} not found", table_index)))?;

    let mut rows = table.select(&row_sel);
    let header: Vec<String> = rows
        .next()
        .map(|row| row.select(&cell_sel).map(cell_text).collect())
        .unwrap_or_default();

    let ticker_idx = header
        .iter()
        .position(|h| h == ticker_column)
        .ok_or_else(|| DataError::ParseError(format!("Column {} not found", ticker_column)))?;
    let name_idx = header
        .iter()
        .position(|h| matches!(h.as_str(), "Company" | "Security" | "Name"));

    let mut listings = Vec::new();
    for row in rows {
        let cells: Vec<String> = row.select(&cell_sel).map(cell_text).collect();
        let Some(symbol) = cells.get(ticker_idx).filter(|s| !s.is_empty()) else {
            continue;
        };
        let mut listing = StockListing::new(symbol.clone());
        listing.company_name = name_idx.and_then(|i| cells.get(i)).cloned();
        listings.push(listing);
    }

    Ok(listings)
}

/// Loads index constituents, cached monthly.
pub struct IndexConstituentsLoader {
    client: Client,
    base_url: String,
    cache: Option<FileCache>,
}

impl IndexConstituentsLoader {
    /// Create a loader against Wikipedia.
    pub fn new() -> Result<Self, DataError> {
        let client = Client::builder()
            .user_agent(concat!("screener/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: WIKIPEDIA_BASE_URL.to_string(),
            cache: None,
        })
    }

    /// Fetch pages from another root.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Cache parsed constituents.
    pub fn with_cache(mut self, cache: FileCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Load the constituents of one index.
    pub async fn load(&self, index: MarketIndex) -> Result<Vec<StockListing>, DataError> {
        match &self.cache {
            Some(cache) => {
                cache
                    .get_or_fetch("index_constituents", &index.to_string(), RefreshInterval::Monthly, || {
                        self.fetch(index)
                    })
                    .await
            }
            None => self.fetch(index).await,
        }
    }

    /// Load several indexes, deduplicating symbols in first-seen order.
    ///
    /// Failing indexes are logged and skipped.
    pub async fn load_union(&self, indexes: &[MarketIndex]) -> Vec<StockListing> {
        let mut seen = std::collections::HashSet::new();
        let mut listings = Vec::new();
        for index in indexes {
            match self.load(*index).await {
                Ok(rows) => {
                    for row in rows {
                        if seen.insert(row.symbol.clone()) {
                            listings.push(row);
                        }
                    }
                }
                Err(e) => warn!(index = %index, error = %e, "Failed to load index constituents"),
            }
        }
        listings
    }

    async fn fetch(&self, index: MarketIndex) -> Result<Vec<StockListing>, DataError> {
        let url = format!("{}/{}", self.base_url, index.page());
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(DataError::Api {
                status: status.as_u16(),
                message: text,
            });
        }

        let html = resp
            .text()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        let listings = parse_constituents(&html, index.table_index(), index.ticker_column())?;
        info!(index = %index, count = listings.len(), "Loaded index constituents");
        Ok(listings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r##"
        <html><body>
        <table><tr><th>Other</th></tr><tr><td>x</td></tr></table>
        <table>
          <tr><th>Company</th><th>Exchange</th><th>Symbol</th></tr>
          <tr><td>Apple Inc.</td><td>NASDAQ</td><td><a href="#">AAPL</a></td></tr>
          <tr><td>Boeing</td><td>NYSE</td><td> BA </td></tr>
          <tr><td>Empty</td><td>NYSE</td><td></td></tr>
        </table>
        </body></html>
    "##;

    #[test]
    fn test_parse_constituents() {
        let rows = parse_constituents(PAGE, 1, "Symbol").unwrap();
        let symbols: Vec<_> = rows.iter().map(|r| r.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["AAPL", "BA"]);
        assert_eq!(rows[0].company_name.as_deref(), Some("Apple Inc."));
    }

    #[test]
    fn test_parse_constituents_errors() {
        assert!(parse_constituents(PAGE, 5, "Symbol").is_err());
        assert!(parse_constituents(PAGE, 1, "Ticker").is_err());
    }

    #[test]
    fn test_index_names() {
        assert_eq!("S&P 500".parse::<MarketIndex>().unwrap(), MarketIndex::Sp500);
        assert_eq!("russell_1000".parse::<MarketIndex>().unwrap(), MarketIndex::Russell1000);
        assert_eq!(MarketIndex::Nasdaq100.ticker_column(), "Ticker");
        assert_eq!(MarketIndex::Nasdaq100.table_index(), 4);
        assert!("ftse".parse::<MarketIndex>().is_err());
    }

    #[tokio::test]
    async fn test_load_union_dedups() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Dow_Jones_Industrial_Average"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/Russell_1000_Index"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let loader = IndexConstituentsLoader::new().unwrap().with_base_url(server.uri());
        let rows = loader
            .load_union(&[MarketIndex::DowJones, MarketIndex::DowJones, MarketIndex::Russell1000])
            .await;
        assert_eq!(rows.len(), 2);
    }
}
