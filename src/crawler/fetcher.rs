//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building HTTP clients from the configured headers and cookies
//! - Gating the number of requests in flight
//! - Classifying throttling and error responses

use crate::config::HttpConfig;
use crate::{ConfigError, HarvestError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, COOKIE};
use reqwest::{Client, Response, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Builds an HTTP client with proper configuration
///
/// Extra headers from `[http.headers]` become default headers; cookies from
/// `[http.cookies]` are sent as a single `Cookie` header on every request.
///
/// # Arguments
///
/// * `config` - The HTTP configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(HarvestError)` - Invalid header or client construction failure
pub fn build_http_client(config: &HttpConfig) -> Result<Client, HarvestError> {
    let mut headers = HeaderMap::new();

    for (name, value) in &config.headers {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
            ConfigError::Validation(format!("Invalid header name '{}': {}", name, e))
        })?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            ConfigError::Validation(format!("Invalid value for header '{}': {}", name, e))
        })?;
        headers.insert(name, value);
    }

    if !config.cookies.is_empty() {
        let cookie = config
            .cookies
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join("; ");
        let value = HeaderValue::from_str(&cookie)
            .map_err(|e| ConfigError::Validation(format!("Invalid cookie value: {}", e)))?;
        headers.insert(COOKIE, value);
    }

    let client = Client::builder()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .gzip(true)
        .brotli(true)
        .build()?;

    Ok(client)
}

/// Issues bounded GET requests shared by the collector and the downloader
///
/// Every fetch holds a permit of the concurrency gate until its
/// [`FetchedPage`] is consumed or dropped.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
    gate: Arc<Semaphore>,
}

impl PageFetcher {
    /// Creates a fetcher over an existing client
    pub fn new(client: Client, max_concurrent: usize) -> Self {
        Self {
            client,
            gate: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    /// Creates a fetcher from the HTTP configuration
    pub fn from_config(config: &HttpConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(config)?;
        Ok(Self::new(client, config.max_concurrent_requests as usize))
    }

    /// Number of gate permits currently free
    pub fn available_permits(&self) -> usize {
        self.gate.available_permits()
    }

    /// Fetches a URL and classifies the response
    ///
    /// | Condition | Result |
    /// |-----------|--------|
    /// | 2xx | `Ok(FetchedPage)` |
    /// | HTTP 429 | `RateLimited` |
    /// | Other non-success status | `Http` |
    /// | Connection, timeout, TLS | `Transport` |
    pub async fn fetch(&self, url: &str) -> Result<FetchedPage, HarvestError> {
        let permit = self
            .gate
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| HarvestError::Task(format!("fetch gate closed: {}", e)))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| HarvestError::Transport {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("Upstream throttled request to {}", url);
            return Err(HarvestError::RateLimited {
                url: url.to_string(),
            });
        }

        if !status.is_success() {
            return Err(HarvestError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        tracing::trace!("Fetched {} ({})", url, status);

        Ok(FetchedPage {
            url: url.to_string(),
            status,
            response,
            _permit: permit,
        })
    }
}

/// A successful response together with its gate permit
///
/// Reading the body consumes the page; dropping it unread releases the
/// connection and the permit as well.
#[derive(Debug)]
pub struct FetchedPage {
    url: String,
    status: StatusCode,
    response: Response,
    _permit: OwnedSemaphorePermit,
}

impl FetchedPage {
    /// HTTP status code of the response
    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    /// Reads the body as text
    pub async fn text(self) -> Result<String, HarvestError> {
        let url = self.url;
        self.response
            .text()
            .await
            .map_err(|e| HarvestError::Transport { url, source: e })
    }

    /// Reads the body as raw bytes
    pub async fn bytes(self) -> Result<Vec<u8>, HarvestError> {
        let url = self.url;
        self.response
            .bytes()
            .await
            .map(|body| body.to_vec())
            .map_err(|e| HarvestError::Transport { url, source: e })
    }
}
