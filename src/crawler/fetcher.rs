//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests of a backup run, including:
//! - Building the HTTP client with user agent and cookie jar
//! - Retry logic with exponential backoff for transient failures
//! - Request/response correlation in the debug log
//! - The ignore-errors policy for image downloads

use crate::config::{Config, RetryConfig};
use crate::{AdkeepError, Result};
use bytes::Bytes;
use rand::Rng;
use reqwest::{cookie::Jar, Client, Method, StatusCode};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_retry::RetryIf;

/// Statuses that indicate a temporary server-side problem
pub const RETRYABLE_STATUSES: [StatusCode; 3] = [
    StatusCode::BAD_GATEWAY,
    StatusCode::SERVICE_UNAVAILABLE,
    StatusCode::GATEWAY_TIMEOUT,
];

const CORRELATION_ALPHABET: &[u8] = b"ABCDEF0123456789";
const CORRELATION_ID_LEN: usize = 8;

/// Failure of a single HTTP exchange
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to build request: {0}")]
    Request(#[source] reqwest::Error),

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("server busy, status {0}")]
    RetryableStatus(StatusCode),

    #[error("page not retrievable, status {0}")]
    Status(StatusCode),

    #[error("failed to drain response body: {0}")]
    Drain(#[source] reqwest::Error),
}

impl FetchError {
    /// Returns true if the exchange should be attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::RetryableStatus(_))
    }
}

/// How often and how patiently a request is retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Delays before each retry: `base * 2^n` for retry `n`
    pub fn delays(&self) -> impl Iterator<Item = Duration> {
        let base = self.base_delay;
        (0..self.max_retries).map(move |n| base * 2u32.pow(n))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryConfig::default().into()
    }
}

impl From<RetryConfig> for RetryPolicy {
    fn from(config: RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.base_delay_ms),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `user_agent` - The User-Agent header sent with every request
/// * `cookies` - Cookie jar shared by all requests of the client
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(user_agent: &str, cookies: Arc<Jar>) -> std::result::Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent)
        .connect_timeout(Duration::from_secs(10))
        .cookie_provider(cookies)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Generates a short random id pairing request and response log lines
pub fn correlation_id() -> String {
    let mut rng = rand::rng();
    (0..CORRELATION_ID_LEN)
        .map(|_| CORRELATION_ALPHABET[rng.random_range(0..CORRELATION_ALPHABET.len())] as char)
        .collect()
}

/// Retrying HTTP transport
///
/// Cloning is cheap; clones share the connection pool and the cookie jar.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    cookies: Arc<Jar>,
    retry: RetryPolicy,
    ignore_errors: bool,
}

impl Transport {
    /// Creates a transport from the run configuration
    pub fn new(config: &Config) -> std::result::Result<Self, reqwest::Error> {
        Self::with_policy(&config.user_agent, config.retry.into(), config.ignore_errors)
    }

    /// Creates a transport with an explicit retry policy
    pub fn with_policy(
        user_agent: &str,
        retry: RetryPolicy,
        ignore_errors: bool,
    ) -> std::result::Result<Self, reqwest::Error> {
        let cookies = Arc::new(Jar::default());
        let client = build_http_client(user_agent, Arc::clone(&cookies))?;

        Ok(Self {
            client,
            cookies,
            retry,
            ignore_errors,
        })
    }

    /// The cookie jar shared by all requests of this transport
    pub fn cookies(&self) -> &Arc<Jar> {
        &self.cookies
    }

    /// Fetches a page body with GET
    pub async fn get(&self, url: &str) -> Result<Bytes> {
        self.send(Method::GET, url, None).await
    }

    /// Sends a request, retrying transient failures
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | 2xx | Return body |
    /// | 502, 503, 504 | Drain body, back off, retry |
    /// | Transport error | Back off, retry |
    /// | Other status | Fail immediately |
    /// | Drain failure | Fail immediately |
    ///
    /// The body is buffered and resent verbatim on every attempt. After the
    /// last retry the root cause is returned together with the URL.
    pub async fn send(&self, method: Method, url: &str, body: Option<Bytes>) -> Result<Bytes> {
        let transport = self;
        let action = move || transport.attempt(method.clone(), url, body.clone());

        let condition = |err: &FetchError| {
            let retry = err.is_retryable();
            if retry {
                tracing::debug!(url, error = %err, "retrying request");
            }
            retry
        };

        RetryIf::start(self.retry.delays(), action, condition)
            .await
            .map_err(|source| AdkeepError::Fetch {
                url: url.to_string(),
                source,
            })
    }

    /// Fetches an image, honouring the ignore-errors policy
    ///
    /// # Returns
    ///
    /// * `Ok(Some(Bytes))` - The image data
    /// * `Ok(None)` - The download failed and errors are ignored
    /// * `Err(AdkeepError)` - The download failed
    pub async fn get_image(&self, url: &str) -> Result<Option<Bytes>> {
        tracing::debug!(url, "fetching ad image");

        match self.get(url).await {
            Ok(data) => Ok(Some(data)),
            Err(err) if self.ignore_errors => {
                tracing::info!(url, error = %err, "Failed to download image, error ignored");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Performs one HTTP exchange
    async fn attempt(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
    ) -> std::result::Result<Bytes, FetchError> {
        let mut builder = self.client.request(method, url);
        if let Some(body) = body {
            builder = builder.body(body);
        }
        let request = builder.build().map_err(FetchError::Request)?;

        let id = correlation_id();
        tracing::debug!(
            id = %id,
            method = %request.method(),
            url = %request.url(),
            host = request.url().host_str().unwrap_or_default(),
            "request"
        );

        let response = self
            .client
            .execute(request)
            .await
            .map_err(FetchError::Transport)?;

        let status = response.status();
        tracing::debug!(
            id = %id,
            status = status.as_u16(),
            content_length = ?response.content_length(),
            "response"
        );

        if status.is_success() {
            return response.bytes().await.map_err(FetchError::Transport);
        }

        if RETRYABLE_STATUSES.contains(&status) {
            // Drain so the connection goes back to the pool
            response.bytes().await.map_err(FetchError::Drain)?;
            return Err(FetchError::RetryableStatus(status));
        }

        Err(FetchError::Status(status))
    }
}
