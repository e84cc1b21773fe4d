//! Contact-Harvest: discovers published email addresses on public websites
//!
//! This crate takes a list of candidate site URLs (usually the results of a
//! keyword search), visits each home page, follows a handful of same-site
//! "contact"-style links, and extracts deduplicated email addresses from the
//! fetched HTML. Sites are crawled concurrently under a bounded worker pool
//! with per-host rate limiting.

pub mod config;
pub mod crawler;
pub mod extract;
pub mod output;
pub mod search;
pub mod url;

use std::fmt;
use thiserror::Error;

/// Main error type for Contact-Harvest operations
///
/// Only errors that abort a whole run live here. Per-page and per-site
/// failures are carried as [`ErrorKind`] values inside crawl results.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Search error: {0}")]
    Search(#[from] search::SearchError),

    #[error("Output error: {0}")]
    Output(#[from] output::OutputError),

    #[error("No candidate sites to crawl")]
    NoCandidates,

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Classification of crawl failures
///
/// Every failure that can happen while crawling a page or a site maps onto
/// exactly one of these kinds. Only `NoCandidates` is fatal for a crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Candidate or link URL is malformed or not HTTP(S)
    InvalidUrl,

    /// Request did not complete within the configured timeout
    Timeout,

    /// Connection could not be established or was dropped
    ConnectionError,

    /// Server answered with a non-2xx status
    HttpError(u16),

    /// Fetched body could not be used as an HTML document
    ParseError,

    /// Nothing to crawl
    NoCandidates,
}

impl ErrorKind {
    /// Returns true if a fetch failing with this kind may be retried
    ///
    /// Timeouts, connection errors and 5xx responses are transient; 4xx
    /// responses and everything else are final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::ConnectionError => true,
            Self::HttpError(status) => (500..600).contains(status),
            _ => false,
        }
    }

    /// Short machine-friendly label used in structured log fields
    pub fn label(&self) -> &'static str {
        match self {
            Self::InvalidUrl => "invalid_url",
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::HttpError(_) => "http_error",
            Self::ParseError => "parse_error",
            Self::NoCandidates => "no_candidates",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::HttpError(status) => write!(f, "http_error({})", status),
            other => write!(f, "{}", other.label()),
        }
    }
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Missing credential: environment variable {0} is not set")]
    MissingCredential(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Result type alias for Contact-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use crawler::{crawl, CandidateSite, Coordinator, CrawlReport, EmailRecord};
pub use extract::extract_emails;
pub use crate::url::{extract_domain, normalize_url, registered_domain};
