//! Network access to the feeds.
//!
//! The orchestrator only sees the [`FeedTransport`] trait, which returns
//! the raw response body of one attempt. Decoding happens upstream so
//! that a malformed body is classified as a decode failure rather than a
//! network one. [`HttpTransport`] is the [`reqwest`] implementation.

use async_trait::async_trait;

use crate::endpoint::Endpoint;
use crate::error::TransportError;

/// One network attempt against one endpoint.
#[async_trait]
pub trait FeedTransport: Send + Sync {
    /// Fetch the raw body of `endpoint`.
    async fn fetch(&self, endpoint: Endpoint) -> Result<String, TransportError>;
}

/// HTTP client for the feed service.
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    series_limit: u32,
}

impl HttpTransport {
    /// Create a transport for a feed service.
    ///
    /// * `base_url` - e.g. `https://feeds.example.org/v1`.
    /// * `series_limit` - row limit requested from the series endpoint.
    pub fn new(base_url: impl Into<String>, series_limit: u32) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, series_limit)
    }

    /// Create a transport reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>, series_limit: u32) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            series_limit,
        }
    }

    /// Full request URL for an endpoint.
    pub fn url_for(&self, endpoint: Endpoint) -> String {
        match endpoint {
            Endpoint::Series => format!("{}/series?limit={}", self.base_url, self.series_limit),
            other => format!("{}/{}", self.base_url, other.name()),
        }
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`TransportError::Status`]
    /// containing the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl FeedTransport for HttpTransport {
    async fn fetch(&self, endpoint: Endpoint) -> Result<String, TransportError> {
        let url = self.url_for(endpoint);
        tracing::debug!(endpoint = %endpoint, url = %url, "Fetching feed");

        let response = self.client.get(&url).send().await?;
        let response = Self::ensure_success(response).await?;
        Ok(response.text().await?)
    }
}
