//! Candidate site sources
//!
//! The crawler only needs an ordered list of URLs. This module provides the
//! [`SearchProvider`] seam plus two sources:
//! - [`GoogleSearch`] queries the Google Custom Search JSON API
//! - [`FileCandidates`] reads URLs from a local file

mod file;
mod google;

pub use file::FileCandidates;
pub use google::GoogleSearch;

use crate::crawler::CandidateSite;
use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while collecting candidate sites
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Search API returned HTTP {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Search API rate limit exceeded")]
    RateLimit,

    #[error("Failed to read candidate file: {0}")]
    Io(#[from] std::io::Error),
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub url: String,
    pub title: String,
    pub snippet: String,
}

impl SearchHit {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            snippet: String::new(),
        }
    }
}

impl From<SearchHit> for CandidateSite {
    fn from(hit: SearchHit) -> Self {
        CandidateSite::new(hit.url)
    }
}

/// Source of candidate sites, in ranking order
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Returns up to `pages` pages of results for `query`
    async fn search(&self, query: &str, pages: u32) -> Result<Vec<SearchHit>, SearchError>;

    /// Short name used in logs
    fn name(&self) -> &str;
}

/// Runs a provider and converts its hits into crawl candidates
pub async fn collect_candidates(
    provider: &dyn SearchProvider,
    query: &str,
    pages: u32,
) -> Result<Vec<CandidateSite>, SearchError> {
    tracing::info!("Searching {} for: {}", provider.name(), query);
    let hits = provider.search(query, pages).await?;
    tracing::info!("Found {} URLs to crawl", hits.len());
    Ok(hits.into_iter().map(CandidateSite::from).collect())
}
