//! News article text extraction.

use reqwest::Client;
use scraper::{Html, Selector};
use screener_core::error::DataError;
use std::time::Duration;
use tracing::debug;

/// Join the text of every `<p>` element, collapsing whitespace.
pub fn extract_paragraph_text(html: &str) -> String {
    let Ok(selector) = Selector::parse("p") else {
        return String::new();
    };
    let document = Html::parse_document(html);
    document
        .select(&selector)
        .flat_map(|p| p.text())
        .collect::<Vec<_>>()
        .join(" ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Downloads articles and returns their paragraph text.
pub struct ArticleFetcher {
    client: Client,
}

impl ArticleFetcher {
    /// Create a fetcher with a request timeout.
    pub fn new(timeout: Duration) -> Result<Self, DataError> {
        let client = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; screener)")
            .timeout(timeout)
            .build()
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(Self { client })
    }

    /// Fetch an article's text; any failure yields an empty string.
    pub async fn fetch_text(&self, url: &str) -> String {
        match self.try_fetch(url).await {
            Ok(text) => text,
            Err(e) => {
                debug!(url, error = %e, "Failed to fetch article");
                String::new()
            }
        }
    }

    async fn try_fetch(&self, url: &str) -> Result<String, DataError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(DataError::Api {
                status: resp.status().as_u16(),
                message: url.to_string(),
            });
        }

        let html = resp
            .text()
            .await
            .map_err(|e| DataError::ConnectionError(e.to_string()))?;
        Ok(extract_paragraph_text(&html))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_paragraph_text() {
        let html = "<html><body><h1>Title</h1><p>First   line\n of text.</p><div>skip</div><p>Second <b>bold</b>.</p></body></html>";
        assert_eq!(extract_paragraph_text(html), "First line of text. Second bold .");
        assert_eq!(extract_paragraph_text("<div>none</div>"), "");
    }

    #[tokio::test]
    async fn test_fetch_failure_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ok"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<p>Shares rose.</p>"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone"))
            .respond_with(ResponseTemplate::new(410))
            .mount(&server)
            .await;

        let fetcher = ArticleFetcher::new(Duration::from_secs(5)).unwrap();
        assert_eq!(fetcher.fetch_text(&format!("{}/ok", server.uri())).await, "Shares rose.");
        assert_eq!(fetcher.fetch_text(&format!("{}/gone", server.uri())).await, "");
    }
}
