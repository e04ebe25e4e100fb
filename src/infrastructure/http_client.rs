//! HTTP client for the scrapers with rate limiting and error handling
//!
//! All pipelines are sequential, so the limiter only spaces requests out; it
//! never has to arbitrate between concurrent callers.

use std::num::NonZeroU32;
use std::time::Duration;

use governor::{
    clock::DefaultClock,
    state::{direct::NotKeyed, InMemoryState},
    Quota, RateLimiter,
};
use reqwest::{
    header::{HeaderMap, HeaderValue, CONTENT_LENGTH},
    Client, RequestBuilder, Response,
};
use thiserror::Error;
use tracing::debug;

use crate::infrastructure::config::HttpConfig;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid HTTP client configuration: {0}")]
    Config(String),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("HTTP request failed with status {status}: {url}")]
    Status { status: u16, url: String },
}

impl FetchError {
    fn transport(url: &str, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.to_string(),
            source,
        }
    }
}

/// Rate limited `reqwest` wrapper shared by every pipeline
pub struct HttpClient {
    client: Client,
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
}

impl HttpClient {
    /// Create a new HTTP client with the given configuration
    pub fn new(config: HttpConfig) -> Result<Self, FetchError> {
        Self::with_default_headers(config, HeaderMap::new())
    }

    /// Create a client that sends `headers` on every request
    pub fn with_default_headers(config: HttpConfig, headers: HeaderMap) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .gzip(true)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .map_err(|e| FetchError::Config(e.to_string()))?;

        let rate = NonZeroU32::new(config.max_requests_per_second)
            .ok_or_else(|| FetchError::Config("Rate limit must be greater than 0".to_string()))?;
        let rate_limiter = RateLimiter::direct(Quota::per_second(rate));

        Ok(Self { client, rate_limiter })
    }

    /// Raw request builder; pass the result to [`HttpClient::send`]
    pub fn request(&self, method: reqwest::Method, url: &str) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Send a request after waiting for the rate limiter; non-2xx is an error
    pub async fn send(&self, url: &str, request: RequestBuilder) -> Result<Response, FetchError> {
        self.rate_limiter.until_ready().await;
        debug!("Fetching URL: {}", url);

        let response = request.send().await.map_err(|e| FetchError::transport(url, e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        debug!("Successfully fetched: {} ({})", url, status);
        Ok(response)
    }

    pub async fn get(&self, url: &str) -> Result<Response, FetchError> {
        self.send(url, self.client.get(url)).await
    }

    /// Fetch URL and return text content
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| FetchError::transport(url, e))
    }

    /// `Content-Length` announced by a HEAD request, if any
    pub async fn head_content_length(&self, url: &str) -> Result<Option<u64>, FetchError> {
        let response = self.send(url, self.client.head(url)).await?;
        Ok(response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v: &HeaderValue| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok()))
    }
}
