//! Crawler module for discovering contact pages and email addresses
//!
//! This module contains the core crawling logic, including:
//! - Single-attempt HTTP fetching, retried by the site crawler
//! - Per-host request throttling shared by all workers
//! - Contact link detection on home pages
//! - The per-site crawl state machine
//! - Overall crawl coordination and result aggregation

mod contacts;
mod coordinator;
mod fetcher;
mod report;
mod site;
mod throttle;

pub use contacts::{detect_contact_links, ContactCandidates, ContactLink, ContactLinks};
pub use coordinator::{crawl, Coordinator};
pub use fetcher::{
    build_http_client, FetchOutcome, FetchResult, HttpFetcher, PageFetcher, RetryPolicy,
};
pub use report::{
    CrawlProgress, CrawlReport, EmailRecord, LogProgress, ProgressObserver, SiteFailure,
};
pub use site::{CandidateSite, PageFailure, SiteCrawler, SiteOutcome, SiteState};
pub use throttle::HostThrottle;
