//! Crawl results: email records, the aggregated report, and progress events

use crate::config::SourcePolicy;
use crate::ErrorKind;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt;

/// An email address and the page it was found on
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailRecord {
    /// Lowercased address
    pub address: String,

    /// URL of the first page the address was found on
    pub source_url: String,

    /// Further pages the address appeared on (only kept for `all-sources`)
    pub other_sources: Vec<String>,
}

impl EmailRecord {
    pub fn new(address: impl Into<String>, source_url: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            source_url: source_url.into(),
            other_sources: Vec::new(),
        }
    }

    /// Registers another page for this address according to `policy`
    ///
    /// Returns true if the record changed.
    pub fn add_source(&mut self, source_url: &str, policy: SourcePolicy) -> bool {
        match policy {
            SourcePolicy::FirstSource => false,
            SourcePolicy::AllSources => {
                if self.source_url == source_url
                    || self.other_sources.iter().any(|s| s == source_url)
                {
                    return false;
                }
                self.other_sources.push(source_url.to_string());
                true
            }
        }
    }

    /// First source followed by any additional ones
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.source_url.as_str()).chain(self.other_sources.iter().map(String::as_str))
    }
}

/// A site that could not be crawled, as listed in debug output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteFailure {
    pub site_url: String,
    pub kind: ErrorKind,
    pub message: String,
}

/// Deduplicated result of a whole crawl
///
/// Owned by the coordinator's aggregation loop; the only place it is mutated
/// is [`CrawlReport::merge_site`].
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Records keyed by lowercased address
    pub records: BTreeMap<String, EmailRecord>,

    /// Candidate sites handed to the worker pool
    pub sites_total: usize,

    /// Sites whose home page was fetched
    pub sites_visited: usize,

    /// Sites whose home page could not be fetched (or whose URL was invalid)
    pub sites_failed: usize,

    /// Sites never started because the crawl was cancelled
    pub sites_skipped: usize,

    /// Contact pages detected across all sites
    pub contact_pages_found: usize,

    /// Pages successfully fetched across all sites
    pub pages_fetched: usize,

    /// Failed sites in completion order
    pub failures: Vec<SiteFailure>,

    /// Whether the crawl stopped early
    pub cancelled: bool,

    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,

    policy: SourcePolicy,
}

impl CrawlReport {
    pub fn new(sites_total: usize, policy: SourcePolicy) -> Self {
        Self {
            records: BTreeMap::new(),
            sites_total,
            sites_visited: 0,
            sites_failed: 0,
            sites_skipped: 0,
            contact_pages_found: 0,
            pages_fetched: 0,
            failures: Vec::new(),
            cancelled: false,
            started_at: Utc::now(),
            finished_at: None,
            policy,
        }
    }

    /// Folds one finished site into the report
    pub fn merge_site(&mut self, outcome: super::SiteOutcome) {
        self.pages_fetched += outcome.pages_visited;
        self.contact_pages_found += outcome.contact_pages_found;

        if let Some(failure) = outcome.failure {
            self.sites_failed += 1;
            self.failures.push(SiteFailure {
                site_url: outcome.site_url,
                kind: failure.kind,
                message: failure.message,
            });
            return;
        }

        self.sites_visited += 1;
        for record in outcome.records {
            self.merge_record(record);
        }
    }

    fn merge_record(&mut self, record: EmailRecord) {
        let key = record.address.to_lowercase();
        match self.records.get_mut(&key) {
            Some(existing) => {
                for source in record.sources() {
                    existing.add_source(source, self.policy);
                }
            }
            None => {
                self.records.insert(key, record);
            }
        }
    }

    /// Marks the report complete
    pub fn finish(&mut self, completed: usize, cancelled: bool) {
        self.sites_skipped = self.sites_total.saturating_sub(completed);
        self.cancelled = cancelled;
        self.finished_at = Some(Utc::now());
    }

    /// Number of distinct addresses found
    pub fn email_count(&self) -> usize {
        self.records.len()
    }

    /// Records in address order
    pub fn emails(&self) -> impl Iterator<Item = &EmailRecord> {
        self.records.values()
    }

    /// Addresses grouped by the page they were (first) found on
    pub fn by_source(&self) -> BTreeMap<&str, Vec<&str>> {
        let mut grouped: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        for record in self.records.values() {
            for source in record.sources() {
                grouped.entry(source).or_default().push(record.address.as_str());
            }
        }
        grouped
    }

    /// Sites that finished, successfully or not
    pub fn sites_attempted(&self) -> usize {
        self.sites_visited + self.sites_failed
    }

    /// Wall-clock duration, if finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }

    pub fn policy(&self) -> SourcePolicy {
        self.policy
    }
}

/// Progress of a running crawl, emitted once per finished site
#[derive(Debug, Clone)]
pub struct CrawlProgress {
    pub completed: usize,
    pub total: usize,
    pub site_url: String,
    pub failed: bool,
    pub emails_found: usize,
}

impl fmt::Display for CrawlProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{} sites", self.completed, self.total)
    }
}

/// Receives progress events from the coordinator
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, progress: &CrawlProgress);
}

impl<F> ProgressObserver for F
where
    F: Fn(&CrawlProgress) + Send + Sync,
{
    fn on_progress(&self, progress: &CrawlProgress) {
        self(progress)
    }
}

/// Default observer: one structured `progress` event per site
#[derive(Debug, Default, Clone, Copy)]
pub struct LogProgress;

impl ProgressObserver for LogProgress {
    fn on_progress(&self, progress: &CrawlProgress) {
        tracing::info!(
            completed = progress.completed,
            total = progress.total,
            site = %progress.site_url,
            failed = progress.failed,
            emails = progress.emails_found,
            "progress"
        );
    }
}
