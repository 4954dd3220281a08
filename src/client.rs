//! HTTP client for the package index.
//!
//! [`IndexClient`] is an explicit handle owning the underlying
//! `reqwest::Client`; there is no process-global session state. It implements
//! the two source seams the rest of the crate is written against:
//! [`SearchSource`] for rendered search pages and [`MetadataSource`] for the
//! per-package JSON API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as HttpClient, StatusCode};
use thiserror::Error;
use tracing::debug;
use urlencoding::encode;

use crate::harvest::extract::PackageDocument;
use crate::model::SearchOrdering;

pub const DEFAULT_HOST: &str = "https://pypi.org";

/// Errors from a single remote call. Every failure mode is distinguishable;
/// nothing collapses to a bare "absent".
#[derive(Error, Debug)]
pub enum FetchError {
    /// The index does not know this package (HTTP 404).
    #[error("package '{name}' not found")]
    NotFound { name: String },

    /// Any other non-2xx response.
    #[error("unexpected HTTP status {status} for {url}")]
    Http { status: StatusCode, url: String },

    /// Connection, DNS, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body could not be interpreted as a metadata document.
    #[error("malformed response body: {0}")]
    Malformed(String),
}

/// Source of rendered search result pages.
#[async_trait]
pub trait SearchSource: Send + Sync {
    /// Fetches one search results page body. Page numbers start at 1.
    async fn fetch_page(
        &self,
        keyword: &str,
        ordering: SearchOrdering,
        page: u32,
    ) -> Result<String, FetchError>;
}

/// Source of per-package metadata documents.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetches and parses the metadata document for one package.
    async fn fetch_document(&self, name: &str) -> Result<PackageDocument, FetchError>;
}

/// Client handle for one index host.
///
/// Configuration is builder-style; the handle is cheap to clone and safe to
/// share across tasks.
#[derive(Debug, Clone)]
pub struct IndexClient {
    http: HttpClient,
    host: String,
    request_delay: Duration,
}

impl IndexClient {
    /// Creates a client against [`DEFAULT_HOST`] with a 30 second request
    /// timeout and a 500 ms courtesy delay after each metadata request.
    pub fn new() -> Result<Self, FetchError> {
        Self::with_timeout(Duration::from_secs(30))
    }

    /// Creates a client with an explicit per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Result<Self, FetchError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            host: DEFAULT_HOST.to_string(),
            request_delay: Duration::from_millis(500),
        })
    }

    /// Overrides the index host, e.g. for a mirror or a test server.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the courtesy delay applied after each metadata request.
    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    fn search_url(&self, keyword: &str, ordering: SearchOrdering, page: u32) -> String {
        match ordering {
            SearchOrdering::Newest => format!(
                "{}/search/?o=-created&q={}&page={}",
                self.host,
                encode(keyword),
                page
            ),
            SearchOrdering::Relevance => {
                format!("{}/search/?q={}&page={}", self.host, encode(keyword), page)
            }
        }
    }

    fn metadata_url(&self, name: &str) -> String {
        format!("{}/pypi/{}/json", self.host, encode(name))
    }
}

#[async_trait]
impl SearchSource for IndexClient {
    async fn fetch_page(
        &self,
        keyword: &str,
        ordering: SearchOrdering,
        page: u32,
    ) -> Result<String, FetchError> {
        let url = self.search_url(keyword, ordering, page);
        debug!(%url, page, "fetching search page");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http { status, url });
        }
        Ok(response.text().await?)
    }
}

#[async_trait]
impl MetadataSource for IndexClient {
    async fn fetch_document(&self, name: &str) -> Result<PackageDocument, FetchError> {
        let url = self.metadata_url(name);
        debug!(%url, "fetching package metadata");
        let response = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await;

        // Courtesy pacing applies whether or not the request succeeded.
        let result = match response {
            Ok(response) => {
                let status = response.status();
                if status == StatusCode::NOT_FOUND {
                    Err(FetchError::NotFound {
                        name: name.to_string(),
                    })
                } else if !status.is_success() {
                    Err(FetchError::Http { status, url })
                } else {
                    let body = response.text().await?;
                    salvage_document(&body)
                }
            }
            Err(e) => Err(FetchError::Transport(e)),
        };
        tokio::time::sleep(self.request_delay).await;
        result
    }
}

/// Parses a response body into a metadata document, tolerating bodies where
/// an intermediary wrapped the JSON payload in markup.
///
/// A direct JSON parse is tried first. Failing that, the span from the first
/// `{` to the last `}` is parsed. A body with no such span, or where the
/// span is not valid JSON, is [`FetchError::Malformed`].
pub fn salvage_document(body: &str) -> Result<PackageDocument, FetchError> {
    if let Ok(doc) = serde_json::from_str::<PackageDocument>(body) {
        return Ok(doc);
    }
    let start = body
        .find('{')
        .ok_or_else(|| FetchError::Malformed("no JSON object in body".to_string()))?;
    let end = body
        .rfind('}')
        .ok_or_else(|| FetchError::Malformed("no JSON object in body".to_string()))?;
    if end < start {
        return Err(FetchError::Malformed("no JSON object in body".to_string()));
    }
    serde_json::from_str(&body[start..=end]).map_err(|e| FetchError::Malformed(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_salvage_raw_json() {
        let body = r#"{"info": {"name": "demo", "version": "1.0"}, "urls": [], "releases": {}}"#;
        let doc = salvage_document(body).unwrap();
        assert_eq!(doc.info.unwrap().name.unwrap(), "demo");
    }

    #[test]
    fn test_salvage_wrapped_json() {
        let body = r#"<html><body><pre>{"info": {"name": "demo"}, "urls": [], "releases": {}}</pre></body></html>"#;
        let doc = salvage_document(body).unwrap();
        assert_eq!(doc.info.unwrap().name.unwrap(), "demo");
    }

    #[test]
    fn test_salvage_no_brace_is_malformed() {
        let err = salvage_document("<html><body>nothing here</body></html>").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_salvage_invalid_span_is_malformed() {
        let err = salvage_document("prefix {not json at all} suffix").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_salvage_reversed_braces_is_malformed() {
        let err = salvage_document("} backwards {").unwrap_err();
        assert!(matches!(err, FetchError::Malformed(_)));
    }

    #[test]
    fn test_search_url_orderings() {
        let client = IndexClient::new().unwrap().with_host("https://example.org");
        assert_eq!(
            client.search_url("fpga", SearchOrdering::Newest, 2),
            "https://example.org/search/?o=-created&q=fpga&page=2"
        );
        assert_eq!(
            client.search_url("fpga", SearchOrdering::Relevance, 1),
            "https://example.org/search/?q=fpga&page=1"
        );
    }

    #[test]
    fn test_keyword_is_encoded() {
        let client = IndexClient::new().unwrap().with_host("https://example.org");
        let url = client.search_url("fpga toolchain", SearchOrdering::Relevance, 1);
        assert_eq!(
            url,
            "https://example.org/search/?q=fpga%20toolchain&page=1"
        );
    }

    #[test]
    fn test_metadata_url() {
        let client = IndexClient::new().unwrap().with_host("https://example.org");
        assert_eq!(
            client.metadata_url("requests"),
            "https://example.org/pypi/requests/json"
        );
    }
}
