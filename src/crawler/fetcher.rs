//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building HTTP clients with the configured user agent and timeouts
//! - Single GET attempts to fetch page content
//! - Error classification into [`ErrorKind`]
//!
//! The fetcher holds no per-host state and never retries. The site crawler
//! drives [`RetryPolicy`] and takes the host throttle before every attempt.

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::ErrorKind;
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, redirect::Policy, Client};
use std::time::Duration;
use url::Url;

/// Outcome of fetching a single page
#[derive(Debug, Clone)]
pub enum FetchOutcome {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// The request succeeded but the body is not a document the crawler reads
    Unreadable {
        /// Final URL after redirects
        final_url: Url,
        /// Content-Type the server declared
        content_type: String,
    },

    /// The page could not be fetched
    Failure {
        /// Classification of the failure
        kind: ErrorKind,
        /// Human readable description
        message: String,
    },
}

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub struct FetchResult {
    /// The URL that was requested
    pub url: Url,

    /// Outcome of the last attempt
    pub outcome: FetchOutcome,

    /// Number of attempts made (1 when no retry happened)
    pub attempts: u32,
}

impl FetchResult {
    pub fn success(url: Url, final_url: Url, status_code: u16, body: String) -> Self {
        Self {
            url,
            outcome: FetchOutcome::Success {
                final_url,
                status_code,
                body,
            },
            attempts: 1,
        }
    }

    pub fn failure(url: Url, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            url,
            outcome: FetchOutcome::Failure {
                kind,
                message: message.into(),
            },
            attempts: 1,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, FetchOutcome::Success { .. })
    }

    /// HTML body of a successful fetch
    pub fn body(&self) -> Option<&str> {
        match &self.outcome {
            FetchOutcome::Success { body, .. } => Some(body),
            _ => None,
        }
    }

    /// URL the content was actually served from
    pub fn final_url(&self) -> &Url {
        match &self.outcome {
            FetchOutcome::Success { final_url, .. } | FetchOutcome::Unreadable { final_url, .. } => {
                final_url
            }
            FetchOutcome::Failure { .. } => &self.url,
        }
    }

    /// Failure kind, if the fetch failed
    ///
    /// An unreadable body is not a fetch failure and yields `None`.
    pub fn error_kind(&self) -> Option<ErrorKind> {
        match &self.outcome {
            FetchOutcome::Failure { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// True when another attempt under `policy` may succeed
    pub fn should_retry(&self, policy: &RetryPolicy) -> bool {
        match self.error_kind() {
            Some(kind) => kind.is_transient() && self.attempts <= policy.max_retries,
            None => false,
        }
    }
}

/// Anything that can turn a URL into a [`FetchResult`]
///
/// One call is one request. Implementations must never panic or return early
/// errors: every failure is reported through the returned result.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &Url) -> FetchResult;
}

/// Retry behaviour for transient failures
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,

    /// Delay before the first retry; doubled for each further retry
    pub base_backoff: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlerConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_backoff: Duration::from_millis(config.retry_backoff_ms),
        }
    }

    /// Backoff to wait after the given (zero-based) failed attempt
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.base_backoff
            .saturating_mul(2u32.saturating_pow(attempt.min(16)))
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Example
///
/// ```no_run
/// use contact_harvest::config::{CrawlerConfig, UserAgentConfig};
/// use contact_harvest::crawler::build_http_client;
///
/// let client = build_http_client(&UserAgentConfig::default(), &CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    user_agent: &UserAgentConfig,
    crawler: &CrawlerConfig,
) -> Result<Client, reqwest::Error> {
    let timeout = Duration::from_millis(crawler.request_timeout_ms);

    Client::builder()
        .user_agent(user_agent.value.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// reqwest-backed [`PageFetcher`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds the client from configuration
    pub fn from_config(
        user_agent: &UserAgentConfig,
        crawler: &CrawlerConfig,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(user_agent, crawler)?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    /// Performs one GET request
    ///
    /// | Response | Outcome |
    /// |----------|---------|
    /// | HTTP 2xx, textual content | `Success` |
    /// | HTTP 2xx, other content | `Unreadable` |
    /// | HTTP 4xx / 5xx | `Failure(HttpError)` |
    /// | Timeout | `Failure(Timeout)` |
    /// | Connection error | `Failure(ConnectionError)` |
    async fn fetch(&self, url: &Url) -> FetchResult {
        FetchResult {
            url: url.clone(),
            outcome: fetch_once(&self.client, url).await,
            attempts: 1,
        }
    }
}

/// Performs a single GET request and classifies the response
async fn fetch_once(client: &Client, url: &Url) -> FetchOutcome {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_request_error(&e),
    };

    let status = response.status();
    let final_url = response.url().clone();

    if !status.is_success() {
        return FetchOutcome::Failure {
            kind: ErrorKind::HttpError(status.as_u16()),
            message: format!("HTTP {}", status),
        };
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_lowercase();

    if !is_textual_content(&content_type) {
        return FetchOutcome::Unreadable {
            final_url,
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchOutcome::Success {
            final_url,
            status_code: status.as_u16(),
            body,
        },
        Err(e) => classify_request_error(&e),
    }
}

/// Maps a reqwest error onto the crawl error taxonomy
fn classify_request_error(e: &reqwest::Error) -> FetchOutcome {
    let kind = if e.is_timeout() {
        ErrorKind::Timeout
    } else if e.is_builder() {
        ErrorKind::InvalidUrl
    } else if let Some(status) = e.status() {
        ErrorKind::HttpError(status.as_u16())
    } else {
        // connect failures, resets, TLS and redirect errors
        ErrorKind::ConnectionError
    };

    FetchOutcome::Failure {
        kind,
        message: e.to_string(),
    }
}

/// Content types the extractor can read
///
/// A missing header is accepted; many small sites omit it.
fn is_textual_content(content_type: &str) -> bool {
    content_type.is_empty()
        || content_type.contains("html")
        || content_type.contains("xml")
        || content_type.starts_with("text/")
}
