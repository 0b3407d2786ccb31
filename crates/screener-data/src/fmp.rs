//! Financial Modeling Prep REST client.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::{header, Client};
use screener_core::error::DataError;
use screener_core::traits::{MarketDataSource, ScreenerQuery};
use screener_core::types::{
    AnalystGrade, Bar, CompanyOutlook, Dividend, EarningsEstimate, FinancialRatios, IncomeGrowth,
    IncomeStatement, InstitutionalOwnership, NewsArticle, PriceHistory, PriceTarget,
    ReportingPeriod, SocialSentiment, StockListing,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info};

use crate::throttle::Throttle;

/// Default API root.
pub const DEFAULT_BASE_URL: &str = "https://financialmodelingprep.com/api";

/// Default request budget of the provider plan.
pub const DEFAULT_CALLS_PER_MINUTE: u32 = 300;

/// FMP API configuration.
#[derive(Debug, Clone)]
pub struct FmpConfig {
    pub api_key: String,
    pub base_url: String,
    pub calls_per_minute: u32,
    pub timeout: Duration,
}

impl FmpConfig {
    /// Create config with an API key and default endpoints.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            calls_per_minute: DEFAULT_CALLS_PER_MINUTE,
            timeout: Duration::from_secs(30),
        }
    }

    /// Load the API key from the named environment variable.
    pub fn from_env(var: &str) -> Result<Self, DataError> {
        let api_key = std::env::var(var)
            .map_err(|_| DataError::Configuration(format!("{} not set", var)))?;
        if api_key.trim().is_empty() {
            return Err(DataError::Configuration(format!("{} is empty", var)));
        }
        Ok(Self::new(api_key))
    }

    /// Point the client at another API root (mock servers, proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the request budget.
    pub fn with_calls_per_minute(mut self, calls_per_minute: u32) -> Self {
        self.calls_per_minute = calls_per_minute;
        self
    }
}

/// Financial Modeling Prep client.
pub struct FmpClient {
    config: FmpConfig,
    client: Client,
    throttle: Throttle,
}

impl FmpClient {
    /// Create a new FMP client.
    pub fn new(config: FmpConfig) -> Result<Self, DataError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        let throttle = Throttle::per_minute(config.calls_per_minute);
        info!(
            base_url = %config.base_url,
            delay_ms = throttle.delay().as_millis() as u64,
            "FMP client ready"
        );

        Ok(Self {
            config,
            client,
            throttle,
        })
    }

    /// Create from an environment variable holding the API key.
    pub fn from_env(var: &str) -> Result<Self, DataError> {
        Self::new(FmpConfig::from_env(var)?)
    }

    /// Issue a throttled GET and return the decoded JSON body.
    async fn get_json(&self, path: &str, params: &[(&str, String)]) -> Result<Value, DataError> {
        self.throttle.wait().await;

        let url = format!("{}/{}", self.config.base_url, path);
        let mut query: Vec<(&str, String)> = params.to_vec();
        query.push(("apikey", self.config.api_key.clone()));

        debug!(path, "FMP request");
        let resp = self
            .client
            .get(&url)
            .query(&query)
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

        let body: Value = resp
            .json()
            .await
            .map_err(|e| DataError::ParseError(e.to_string()))?;

        if let Some(message) = body.get("Error Message").and_then(Value::as_str) {
            return Err(DataError::Api {
                status: 200,
                message: message.to_string(),
            });
        }

        Ok(body)
    }

    /// Fetch a list endpoint and decode each row.
    async fn get_rows<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<T>, DataError> {
        let body = self.get_json(path, params).await?;
        Ok(decode_rows(path, body))
    }
}

/// Decode a list payload: a bare array or an object's `historical` array.
///
/// Rows that fail to decode (typically a missing or malformed date) are
/// dropped.
pub(crate) fn decode_rows<T: DeserializeOwned>(path: &str, body: Value) -> Vec<T> {
    let items = match body {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("historical") {
            Some(Value::Array(items)) => items,
            _ => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let total = items.len();
    let rows: Vec<T> = items
        .into_iter()
        .filter_map(|item| serde_json::from_value(item).ok())
        .collect();
    if rows.len() < total {
        debug!(path, dropped = total - rows.len(), "Dropped undecodable rows");
    }
    rows
}

fn screener_params(query: &ScreenerQuery) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("isEtf", query.is_etf.to_string()),
        ("isFund", query.is_fund.to_string()),
        ("isActivelyTrading", query.is_actively_trading.to_string()),
        ("limit", query.limit.to_string()),
    ];
    if !query.exchanges.is_empty() {
        params.push(("exchange", query.exchanges.join(",")));
    }
    let bounds = [
        ("marketCapMoreThan", query.market_cap_more_than),
        ("marketCapLowerThan", query.market_cap_lower_than),
        ("priceMoreThan", query.price_more_than),
        ("priceLowerThan", query.price_lower_than),
        ("betaLowerThan", query.beta_lower_than),
        ("volumeMoreThan", query.volume_more_than),
    ];
    for (name, value) in bounds {
        if let Some(v) = value {
            params.push((name, format!("{}", v)));
        }
    }
    if let Some(country) = &query.country {
        params.push(("country", country.clone()));
    }
    if let Some(sector) = &query.sector {
        params.push(("sector", sector.clone()));
    }
    if let Some(industry) = &query.industry {
        params.push(("industry", industry.clone()));
    }
    params
}

#[async_trait]
impl MarketDataSource for FmpClient {
    async fn stock_screener(&self, query: &ScreenerQuery) -> Result<Vec<StockListing>, DataError> {
        self.get_rows("v3/stock-screener", &screener_params(query)).await
    }

    async fn tradable_symbols(&self) -> Result<Vec<StockListing>, DataError> {
        self.get_rows("v3/available-traded/list", &[]).await
    }

    async fn daily_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<PriceHistory, DataError> {
        let path = format!("v3/historical-price-full/{}", symbol);
        let params = [
            ("from", start.format("%Y-%m-%d").to_string()),
            ("to", end.format("%Y-%m-%d").to_string()),
            ("serietype", "line".to_string()),
        ];
        let bars: Vec<Bar> = self.get_rows(&path, &params).await?;
        Ok(PriceHistory::new(symbol, bars))
    }

    async fn analyst_grades(&self, symbol: &str) -> Result<Vec<AnalystGrade>, DataError> {
        self.get_rows(&format!("v3/grade/{}", symbol), &[]).await
    }

    async fn income_growth(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeGrowth>, DataError> {
        let path = format!("v3/income-statement-growth/{}", symbol);
        self.get_rows(&path, &[("period", period.as_query().to_string())])
            .await
    }

    async fn financial_ratios(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<FinancialRatios>, DataError> {
        let path = format!("v3/ratios/{}", symbol);
        self.get_rows(&path, &[("period", period.as_query().to_string())])
            .await
    }

    async fn social_sentiment(&self, symbol: &str) -> Result<Vec<SocialSentiment>, DataError> {
        self.get_rows(
            "v4/historical/social-sentiment",
            &[("symbol", symbol.to_string())],
        )
        .await
    }

    async fn stock_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsArticle>, DataError> {
        self.get_rows(
            "v3/stock_news",
            &[("tickers", symbol.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    async fn dividends(&self, symbol: &str) -> Result<Vec<Dividend>, DataError> {
        let path = format!("v3/historical-price-full/stock_dividend/{}", symbol);
        self.get_rows(&path, &[]).await
    }

    async fn price_targets(&self, symbol: &str) -> Result<Vec<PriceTarget>, DataError> {
        self.get_rows("v4/price-target", &[("symbol", symbol.to_string())])
            .await
    }

    async fn analyst_estimates(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<EarningsEstimate>, DataError> {
        let path = format!("v3/analyst-estimates/{}", symbol);
        self.get_rows(&path, &[("period", period.as_query().to_string())])
            .await
    }

    async fn institutional_ownership(
        &self,
        symbol: &str,
    ) -> Result<Vec<InstitutionalOwnership>, DataError> {
        self.get_rows(
            "v4/institutional-ownership/symbol-ownership",
            &[
                ("symbol", symbol.to_string()),
                ("includeCurrentQuarter", "false".to_string()),
            ],
        )
        .await
    }

    async fn income_statements(
        &self,
        symbol: &str,
        period: ReportingPeriod,
    ) -> Result<Vec<IncomeStatement>, DataError> {
        let path = format!("v3/income-statement/{}", symbol);
        self.get_rows(&path, &[("period", period.as_query().to_string())])
            .await
    }

    async fn company_outlook(&self, symbol: &str) -> Result<Option<CompanyOutlook>, DataError> {
        let body = self
            .get_json("v4/company-outlook", &[("symbol", symbol.to_string())])
            .await?;
        match body {
            Value::Object(ref map) if !map.is_empty() => serde_json::from_value(body)
                .map(Some)
                .map_err(|e| DataError::ParseError(format!("{}: {}", symbol, e))),
            _ => Ok(None),
        }
    }

    fn name(&self) -> &str {
        "fmp"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> FmpClient {
        let config = FmpConfig::new("test-key")
            .with_base_url(server.uri())
            .with_calls_per_minute(0);
        FmpClient::new(config).unwrap()
    }

    #[test]
    fn test_decode_rows_drops_bad_dates() {
        let body = json!([
            {"date": "2024-05-01", "newGrade": "Buy"},
            {"date": "not a date", "newGrade": "Sell"},
        ]);
        let grades: Vec<AnalystGrade> = decode_rows("v3/grade/X", body);
        assert_eq!(grades.len(), 1);
        assert_eq!(grades[0].new_grade, "Buy");

        let empty: Vec<AnalystGrade> = decode_rows("v3/grade/X", json!({}));
        assert!(empty.is_empty());
    }

    #[test]
    fn test_screener_params() {
        let query = ScreenerQuery {
            market_cap_more_than: Some(2_000_000_000.0),
            beta_lower_than: Some(1.5),
            ..Default::default()
        };
        let params = screener_params(&query);
        assert!(params.contains(&("exchange", "nyse,nasdaq,amex".to_string())));
        assert!(params.contains(&("marketCapMoreThan", "2000000000".to_string())));
        assert!(params.contains(&("betaLowerThan", "1.5".to_string())));
        assert!(params.contains(&("country", "US".to_string())));
        assert!(!params.iter().any(|(k, _)| *k == "priceMoreThan"));
    }

    #[tokio::test]
    async fn test_daily_prices_historical_payload() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/historical-price-full/AAPL"))
            .and(query_param("serietype", "line"))
            .and(query_param("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "symbol": "AAPL",
                "historical": [
                    {"date": "2024-01-03", "close": 184.25},
                    {"date": "2024-01-02", "close": 185.64}
                ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        let history = client.daily_prices("AAPL", start, end).await.unwrap();

        assert_eq!(history.len(), 2);
        assert_eq!(history.last().unwrap().close, 184.25);
    }

    #[tokio::test]
    async fn test_http_error_maps_to_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v3/grade/AAPL"))
            .respond_with(ResponseTemplate::new(429).set_body_string("Limit Reach"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        match client.analyst_grades("AAPL").await {
            Err(DataError::Api { status, message }) => {
                assert_eq!(status, 429);
                assert_eq!(message, "Limit Reach");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_error_message_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/price-target"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"Error Message": "Invalid API KEY."})),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(matches!(
            client.price_targets("AAPL").await,
            Err(DataError::Api { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_outlook_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v4/company-outlook"))
            .and(query_param("symbol", "ZZZZ"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert!(client.company_outlook("ZZZZ").await.unwrap().is_none());
    }
}
