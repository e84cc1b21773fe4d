//! Per-site crawl: home page, contact pages, email extraction
//!
//! Each candidate site walks through [`SiteState`]:
//!
//! ```text
//! Pending -> FetchingHome -> HomeFailed -> Done
//!                         -> HomeFetched -> DetectingContacts
//!                              -> [FetchingContacts] -> ExtractingEmails -> Done
//! ```
//!
//! A failed home page ends the site with no contact-page attempt. A failed
//! contact page is recorded and its siblings carry on.

use super::contacts::detect_contact_links;
use super::fetcher::{FetchOutcome, FetchResult, PageFetcher, RetryPolicy};
use super::report::EmailRecord;
use super::throttle::HostThrottle;
use crate::config::{Config, SourcePolicy};
use crate::extract::EmailExtractor;
use crate::url::normalize_url;
use crate::ErrorKind;
use futures::future::join_all;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use url::Url;

/// A site to crawl, as returned by the search step
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CandidateSite {
    /// Raw URL; normalized before any request is made
    pub url: String,
}

impl CandidateSite {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl From<&str> for CandidateSite {
    fn from(url: &str) -> Self {
        Self::new(url)
    }
}

impl From<String> for CandidateSite {
    fn from(url: String) -> Self {
        Self::new(url)
    }
}

/// Represents the current state of a site crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SiteState {
    /// Not started yet
    Pending,

    /// Home page request in flight
    FetchingHome,

    /// Home page could not be fetched; no further work
    HomeFailed,

    /// Home page body available
    HomeFetched,

    /// Scanning the home page for contact links
    DetectingContacts,

    /// Contact page requests in flight
    FetchingContacts,

    /// Pulling addresses out of every fetched body
    ExtractingEmails,

    /// Finished, successfully or not
    Done,
}

impl SiteState {
    /// Returns true if this is a terminal state (no further processing needed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done)
    }

    /// Validates a state transition
    pub fn can_transition_to(&self, next: SiteState) -> bool {
        use SiteState::*;
        matches!(
            (self, next),
            (Pending, FetchingHome)
                | (Pending, HomeFailed)
                | (FetchingHome, HomeFailed)
                | (FetchingHome, HomeFetched)
                | (HomeFailed, Done)
                | (HomeFetched, DetectingContacts)
                | (DetectingContacts, FetchingContacts)
                | (DetectingContacts, ExtractingEmails)
                | (FetchingContacts, ExtractingEmails)
                | (ExtractingEmails, Done)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::FetchingHome => "fetching_home",
            Self::HomeFailed => "home_failed",
            Self::HomeFetched => "home_fetched",
            Self::DetectingContacts => "detecting_contacts",
            Self::FetchingContacts => "fetching_contacts",
            Self::ExtractingEmails => "extracting_emails",
            Self::Done => "done",
        }
    }
}

impl fmt::Display for SiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A page that could not be fetched or read
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageFailure {
    pub url: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Everything one site crawl produced
#[derive(Debug, Clone)]
pub struct SiteOutcome {
    /// Candidate URL as given
    pub site_url: String,

    pub final_state: SiteState,

    /// Addresses in first-seen order (home page first)
    pub records: Vec<EmailRecord>,

    /// Pages fetched successfully (home + contact pages)
    pub pages_visited: usize,

    /// Contact links selected for fetching
    pub contact_pages_found: usize,

    /// Set when the site as a whole failed
    pub failure: Option<PageFailure>,

    /// Contact pages and unreadable bodies that failed without failing the site
    pub page_failures: Vec<PageFailure>,
}

impl SiteOutcome {
    pub fn failed(&self) -> bool {
        self.failure.is_some()
    }

    pub fn emails(&self) -> impl Iterator<Item = &str> {
        self.records.iter().map(|r| r.address.as_str())
    }
}

/// Runs the per-site crawl against a shared fetcher and throttle
///
/// Holds no mutable state of its own, so one instance is shared by all
/// workers. Every request attempt, retries included, waits for the host's
/// turn in the throttle.
pub struct SiteCrawler {
    fetcher: Arc<dyn PageFetcher>,
    throttle: Arc<HostThrottle>,
    retry: RetryPolicy,
    extractor: EmailExtractor,
    keywords: Vec<String>,
    max_contact_links: usize,
    source_policy: SourcePolicy,
}

impl SiteCrawler {
    pub fn new(config: &Config, fetcher: Arc<dyn PageFetcher>, throttle: Arc<HostThrottle>) -> Self {
        Self {
            fetcher,
            throttle,
            retry: RetryPolicy::from_config(&config.crawler),
            extractor: EmailExtractor::new(),
            keywords: config.contacts.keywords.clone(),
            max_contact_links: config.crawler.max_contact_links as usize,
            source_policy: config.crawler.source_policy,
        }
    }

    /// Crawls one site to completion
    ///
    /// Never fails: every problem ends up in the returned [`SiteOutcome`].
    pub async fn crawl_site(&self, site: &CandidateSite) -> SiteOutcome {
        let mut tracker = Tracker::new(&site.url);
        let mut outcome = SiteOutcome {
            site_url: site.url.clone(),
            final_state: SiteState::Pending,
            records: Vec::new(),
            pages_visited: 0,
            contact_pages_found: 0,
            failure: None,
            page_failures: Vec::new(),
        };

        let home_url = match normalize_url(&site.url) {
            Ok(url) => url,
            Err(e) => {
                tracker.advance(SiteState::HomeFailed);
                return self.fail_site(outcome, tracker, ErrorKind::InvalidUrl, e.to_string());
            }
        };

        tracing::info!(url = %home_url, "site_started");
        tracker.advance(SiteState::FetchingHome);

        let home = self.fetch_page(&home_url).await;
        let (home_page, home_body) = match home.outcome {
            FetchOutcome::Success { final_url, body, .. } => (final_url, Some(body)),
            FetchOutcome::Unreadable {
                final_url,
                content_type,
            } => {
                outcome.page_failures.push(unreadable_page(&final_url, &content_type));
                (final_url, None)
            }
            FetchOutcome::Failure { kind, message } => {
                tracker.advance(SiteState::HomeFailed);
                return self.fail_site(outcome, tracker, kind, message);
            }
        };
        outcome.pages_visited += 1;
        tracker.advance(SiteState::HomeFetched);

        tracker.advance(SiteState::DetectingContacts);
        let detected = home_body
            .as_deref()
            .map(|body| detect_contact_links(body, &home_page, &self.keywords));
        let contact_urls: Vec<Url> = match detected {
            Some(Ok(candidates)) => candidates
                .iter()
                .take(self.max_contact_links)
                .map(|link| {
                    tracing::info!(url = %link.url, source = %link.source_page_url, "contact_page_found");
                    link.url
                })
                .collect(),
            Some(Err(kind)) => {
                tracing::debug!(url = %home_page, reason = %kind, "Home page unreadable, no contact links");
                outcome.page_failures.push(PageFailure {
                    url: home_page.to_string(),
                    kind,
                    message: "page body is empty".to_string(),
                });
                Vec::new()
            }
            None => Vec::new(),
        };
        outcome.contact_pages_found = contact_urls.len();

        let mut pages = Vec::new();
        if let Some(body) = home_body {
            pages.push((home_page, body));
        }

        if !contact_urls.is_empty() {
            tracker.advance(SiteState::FetchingContacts);

            let results = join_all(contact_urls.iter().map(|url| self.fetch_page(url))).await;
            for result in results {
                match result.outcome {
                    FetchOutcome::Success { final_url, body, .. } => {
                        outcome.pages_visited += 1;
                        pages.push((final_url, body));
                    }
                    FetchOutcome::Unreadable {
                        final_url,
                        content_type,
                    } => {
                        outcome.pages_visited += 1;
                        outcome.page_failures.push(unreadable_page(&final_url, &content_type));
                    }
                    FetchOutcome::Failure { kind, message } => {
                        tracing::debug!(url = %result.url, reason = %kind, "Contact page failed: {}", message);
                        outcome.page_failures.push(PageFailure {
                            url: result.url.to_string(),
                            kind,
                            message,
                        });
                    }
                }
            }
        }

        tracker.advance(SiteState::ExtractingEmails);
        outcome.records = self.extract_records(&pages);

        tracker.advance(SiteState::Done);
        outcome.final_state = tracker.state;
        outcome
    }

    /// Fetches a page, retrying transient failures
    ///
    /// Each attempt first waits for the host's turn, so a retry is delayed by
    /// the larger of its backoff and the host delay. 429 responses feed back
    /// into the throttle.
    async fn fetch_page(&self, url: &Url) -> FetchResult {
        let host = url.host_str().unwrap_or_default();
        let mut attempts = 0;

        loop {
            self.throttle.acquire(host).await;
            let mut result = self.fetcher.fetch(url).await;
            attempts += 1;
            result.attempts = attempts;

            if result.error_kind() == Some(ErrorKind::HttpError(429)) {
                self.throttle.mark_rate_limited(host).await;
            }
            if !result.should_retry(&self.retry) {
                return result;
            }

            let backoff = self.retry.backoff_for(attempts - 1);
            if let FetchOutcome::Failure { kind, message } = &result.outcome {
                tracing::debug!(
                    url = %url,
                    attempt = attempts,
                    reason = %kind,
                    backoff_ms = backoff.as_millis() as u64,
                    "Retrying after transient failure: {}",
                    message
                );
            }
            tokio::time::sleep(backoff).await;
        }
    }

    /// Extracts addresses from every page, deduplicated in first-seen order
    fn extract_records(&self, pages: &[(Url, String)]) -> Vec<EmailRecord> {
        let mut records: Vec<EmailRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for (page_url, body) in pages {
            let source = page_url.as_str();
            for address in self.extractor.matches(body) {
                match index.get(&address) {
                    Some(&i) => {
                        records[i].add_source(source, self.source_policy);
                    }
                    None => {
                        tracing::info!(address = %address, source = %source, "email_found");
                        index.insert(address.clone(), records.len());
                        records.push(EmailRecord::new(address, source));
                    }
                }
            }
        }

        records
    }

    fn fail_site(
        &self,
        mut outcome: SiteOutcome,
        mut tracker: Tracker,
        kind: ErrorKind,
        message: String,
    ) -> SiteOutcome {
        tracing::warn!(url = %outcome.site_url, reason = %kind, "site_failed: {}", message);
        outcome.failure = Some(PageFailure {
            url: outcome.site_url.clone(),
            kind,
            message,
        });
        tracker.advance(SiteState::Done);
        outcome.final_state = tracker.state;
        outcome
    }
}

/// Page failure for a body the crawler cannot read
fn unreadable_page(url: &Url, content_type: &str) -> PageFailure {
    PageFailure {
        url: url.to_string(),
        kind: ErrorKind::ParseError,
        message: format!("not an HTML document ({})", content_type),
    }
}

/// Keeps a site's state and logs each transition
struct Tracker {
    site: String,
    state: SiteState,
}

impl Tracker {
    fn new(site: &str) -> Self {
        Self {
            site: site.to_string(),
            state: SiteState::Pending,
        }
    }

    fn advance(&mut self, next: SiteState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid site transition {} -> {}",
            self.state,
            next
        );
        tracing::trace!(site = %self.site, from = %self.state, to = %next, "Site state change");
        self.state = next;
        if next.is_terminal() {
            tracing::debug!(site = %self.site, "Site crawl finished");
        }
    }
}
