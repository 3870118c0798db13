//! HTTP fetcher
//!
//! Thin adapter over the HTTP client. All network traffic of a run flows
//! through one [`Fetcher`], which enforces the rate-limit contract: at most
//! one request in flight (callers await each fetch), and a mandatory pause
//! after every completed request to the origin.

use crate::{KagamiError, Result};
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Result of fetching a page URL
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Html {
        body: String,
        content_type: String,
    },

    /// The URL answered with something other than HTML
    NotHtml { content_type: String },

    /// Non-success HTTP status
    HttpError { status: u16 },

    /// Connection, TLS, timeout or body-read failure
    NetworkError { error: String },
}

/// A fetched non-HTML resource
#[derive(Debug)]
pub struct FetchedResource {
    pub bytes: Vec<u8>,
    pub content_type: String,
}

/// Builds the HTTP client used for the whole run
pub fn build_http_client() -> std::result::Result<Client, reqwest::Error> {
    let user_agent = format!("kagami/{}", env!("CARGO_PKG_VERSION"));

    Client::builder()
        .user_agent(user_agent)
        .timeout(Duration::from_secs(30))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Sequential fetcher with inter-request delay
pub struct Fetcher {
    client: Client,
    delay: Duration,
}

impl Fetcher {
    pub fn new(delay: Duration) -> std::result::Result<Self, reqwest::Error> {
        Ok(Self {
            client: build_http_client()?,
            delay,
        })
    }

    /// Fetches a page, classifying the outcome.
    ///
    /// Any response whose Content-Type does not mention HTML is reported as
    /// [`FetchResult::NotHtml`] without reading the body as a page. The
    /// configured delay is awaited before returning, whatever the outcome.
    pub async fn fetch_page(&self, url: &Url) -> FetchResult {
        let result = self.fetch_page_inner(url).await;
        self.pause().await;
        result
    }

    async fn fetch_page_inner(&self, url: &Url) -> FetchResult {
        let response = match self.client.get(url.as_str()).send().await {
            Ok(response) => response,
            Err(e) => return classify_request_error(e),
        };

        let status = response.status();
        if !status.is_success() {
            return FetchResult::HttpError {
                status: status.as_u16(),
            };
        }

        let content_type = header_content_type(&response);
        if !content_type.to_lowercase().contains("text/html") {
            return FetchResult::NotHtml { content_type };
        }

        match response.text().await {
            Ok(body) => FetchResult::Html { body, content_type },
            Err(e) => FetchResult::NetworkError {
                error: e.to_string(),
            },
        }
    }

    /// Fetches a resource's raw bytes
    pub async fn fetch_resource(&self, url: &Url) -> Result<FetchedResource> {
        let result = self.fetch_resource_inner(url).await;
        self.pause().await;
        result
    }

    async fn fetch_resource_inner(&self, url: &Url) -> Result<FetchedResource> {
        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| KagamiError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(KagamiError::Fetch {
                url: url.to_string(),
                reason: format!("HTTP {}", status.as_u16()),
            });
        }

        let content_type = header_content_type(&response);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| KagamiError::Fetch {
                url: url.to_string(),
                reason: e.to_string(),
            })?
            .to_vec();

        Ok(FetchedResource {
            bytes,
            content_type,
        })
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

fn header_content_type(response: &reqwest::Response) -> String {
    response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

fn classify_request_error(e: reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "request timeout".to_string()
    } else if e.is_connect() {
        "connection failed".to_string()
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_http_client() {
        assert!(build_http_client().is_ok());
    }

    #[test]
    fn test_fetcher_new() {
        assert!(Fetcher::new(Duration::from_millis(10)).is_ok());
    }

    // Fetch behavior against real responses is covered by the wiremock
    // end-to-end tests in tests/mirror_tests.rs.
}
