//! Crawler coordinator - fans site crawls out over a bounded worker pool
//!
//! This module contains the main crawl loop, including:
//! - Capping the candidate list to the requested number of result pages
//! - Running a fixed number of workers that each take one site at a time
//! - Aggregating site outcomes in completion order into one [`CrawlReport`]
//! - Progress events, global timeout and cancellation

use super::fetcher::{HttpFetcher, PageFetcher};
use super::report::{CrawlProgress, CrawlReport, LogProgress, ProgressObserver};
use super::site::{CandidateSite, SiteCrawler, SiteOutcome};
use super::throttle::HostThrottle;
use crate::config::Config;
use crate::HarvestError;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

/// Main crawl coordinator
///
/// Owns the shared pieces every worker uses: the fetcher, the per-host
/// throttle and the cancellation token.
pub struct Coordinator {
    config: Arc<Config>,
    fetcher: Arc<dyn PageFetcher>,
    throttle: Arc<HostThrottle>,
    cancel: CancellationToken,
    progress: Arc<dyn ProgressObserver>,
}

impl Coordinator {
    /// Creates a coordinator fetching over HTTP
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Ready to crawl
    /// * `Err(HarvestError)` - The HTTP client could not be built
    pub fn new(config: Config) -> Result<Self, HarvestError> {
        let fetcher = HttpFetcher::from_config(&config.user_agent, &config.crawler)?;
        Ok(Self::with_fetcher(config, Arc::new(fetcher)))
    }

    /// Creates a coordinator around any [`PageFetcher`]
    pub fn with_fetcher(config: Config, fetcher: Arc<dyn PageFetcher>) -> Self {
        let throttle = HostThrottle::new(Duration::from_millis(config.crawler.min_host_delay_ms));
        Self {
            config: Arc::new(config),
            fetcher,
            throttle: Arc::new(throttle),
            cancel: CancellationToken::new(),
            progress: Arc::new(LogProgress),
        }
    }

    /// Replaces the default log-based progress reporting
    pub fn with_progress(mut self, observer: Arc<dyn ProgressObserver>) -> Self {
        self.progress = observer;
        self
    }

    /// Token that stops the crawl from starting new sites when cancelled
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Crawls the candidate sites and returns the aggregated report
    ///
    /// At most `max_pages * results-per-page` candidates are crawled.
    /// Candidates are not deduplicated; a site listed twice is crawled twice.
    ///
    /// # Errors
    ///
    /// * `HarvestError::NoCandidates` - nothing to crawl
    ///
    /// Individual site failures never fail the crawl; they are counted in
    /// [`CrawlReport::sites_failed`].
    pub async fn crawl(
        &self,
        candidates: Vec<CandidateSite>,
        max_pages: u32,
    ) -> Result<CrawlReport, HarvestError> {
        let limit = (max_pages as usize).saturating_mul(self.config.crawler.results_per_page as usize);
        let mut sites = candidates;
        sites.truncate(limit);

        if sites.is_empty() {
            tracing::error!("No candidate sites to crawl");
            return Err(HarvestError::NoCandidates);
        }

        let total = sites.len();
        let worker_count = (self.config.crawler.workers as usize).clamp(1, total);
        tracing::info!("Crawling {} sites with {} workers", total, worker_count);

        let run_token = self.cancel.child_token();
        let timer = self.config.crawler.crawl_timeout_secs.map(|secs| {
            let token = run_token.clone();
            tokio::spawn(async move {
                tokio::select! {
                    _ = tokio::time::sleep(Duration::from_secs(secs)) => {
                        tracing::warn!("Crawl timeout of {}s reached, no new sites will start", secs);
                        token.cancel();
                    }
                    _ = token.cancelled() => {}
                }
            })
        });

        let crawler = Arc::new(SiteCrawler::new(
            &self.config,
            self.fetcher.clone(),
            self.throttle.clone(),
        ));
        let queue = Arc::new(Mutex::new(VecDeque::from(sites)));
        let (tx, mut rx) = mpsc::channel::<SiteOutcome>(worker_count);

        let mut workers = JoinSet::new();
        for worker_id in 0..worker_count {
            let crawler = crawler.clone();
            let queue = queue.clone();
            let token = run_token.clone();
            let tx = tx.clone();

            workers.spawn(async move {
                loop {
                    if token.is_cancelled() {
                        tracing::debug!(worker_id, "Cancelled, worker stopping");
                        break;
                    }

                    let next = queue.lock().await.pop_front();
                    let Some(site) = next else {
                        break;
                    };

                    let outcome = crawler.crawl_site(&site).await;
                    if tx.send(outcome).await.is_err() {
                        break;
                    }
                }
            });
        }
        drop(tx);

        let mut report = CrawlReport::new(total, self.config.crawler.source_policy);
        let mut completed = 0;

        while let Some(outcome) = rx.recv().await {
            completed += 1;
            let progress = CrawlProgress {
                completed,
                total,
                site_url: outcome.site_url.clone(),
                failed: outcome.failed(),
                emails_found: outcome.records.len(),
            };
            report.merge_site(outcome);
            self.progress.on_progress(&progress);
        }

        while let Some(joined) = workers.join_next().await {
            if let Err(e) = joined {
                tracing::error!("Crawl worker panicked: {}", e);
            }
        }

        let cancelled = run_token.is_cancelled();
        if let Some(timer) = timer {
            timer.abort();
        }

        report.finish(completed, cancelled && completed < total);

        tracing::info!(
            visited = report.sites_visited,
            failed = report.sites_failed,
            skipped = report.sites_skipped,
            emails = report.email_count(),
            contact_pages = report.contact_pages_found,
            "crawl_completed"
        );

        Ok(report)
    }
}

/// Runs a complete crawl over HTTP with default progress logging
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `candidates` - Sites to crawl, in search order
/// * `max_pages` - Search result pages the candidates came from
pub async fn crawl(
    config: Config,
    candidates: Vec<CandidateSite>,
    max_pages: u32,
) -> Result<CrawlReport, HarvestError> {
    Coordinator::new(config)?.crawl(candidates, max_pages).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::site::tests::{test_config, FixtureFetcher};
    use crate::ErrorKind;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn site_fixture(count: usize) -> (FixtureFetcher, Vec<CandidateSite>) {
        let mut fetcher = FixtureFetcher::default();
        let mut candidates = Vec::new();
        for i in 0..count {
            let home = format!("https://site{}.example/", i);
            if i % 4 == 3 {
                fetcher = fetcher.failing(&home, ErrorKind::ConnectionError);
            } else {
                fetcher = fetcher.page(&home, &format!("<p>owner{}@site{}.example</p>", i, i));
            }
            candidates.push(CandidateSite::new(home));
        }
        (fetcher, candidates)
    }

    #[tokio::test]
    async fn test_empty_candidates_is_fatal() {
        let coordinator =
            Coordinator::with_fetcher(test_config(), Arc::new(FixtureFetcher::default()));
        let result = coordinator.crawl(Vec::new(), 2).await;
        assert!(matches!(result, Err(HarvestError::NoCandidates)));
    }

    #[tokio::test]
    async fn test_zero_pages_is_fatal() {
        let coordinator =
            Coordinator::with_fetcher(test_config(), Arc::new(FixtureFetcher::default()));
        let result = coordinator
            .crawl(vec![CandidateSite::new("https://a.example/")], 0)
            .await;
        assert!(matches!(result, Err(HarvestError::NoCandidates)));
    }

    #[tokio::test]
    async fn test_all_sites_attempted() {
        let (fetcher, candidates) = site_fixture(20);
        let mut config = test_config();
        config.crawler.workers = 5;

        let report = Coordinator::with_fetcher(config, Arc::new(fetcher))
            .crawl(candidates, 2)
            .await
            .unwrap();

        assert_eq!(report.sites_visited + report.sites_failed, 20);
        assert_eq!(report.sites_failed, 5);
        assert_eq!(report.email_count(), 15);
        assert_eq!(report.sites_skipped, 0);
        assert!(!report.cancelled);
    }

    #[tokio::test]
    async fn test_candidates_capped_by_pages() {
        let (fetcher, candidates) = site_fixture(30);
        let fetcher = Arc::new(fetcher);
        let mut config = test_config();
        config.crawler.results_per_page = 10;

        let report = Coordinator::with_fetcher(config, fetcher.clone())
            .crawl(candidates, 1)
            .await
            .unwrap();

        assert_eq!(report.sites_total, 10);
        assert_eq!(report.sites_attempted(), 10);
        assert_eq!(fetcher.requests().len(), 10);
    }

    #[tokio::test]
    async fn test_invalid_candidate_counted_as_failed() {
        let fetcher = FixtureFetcher::default().page("https://ok.example/", "hi@ok.example");
        let report = Coordinator::with_fetcher(test_config(), Arc::new(fetcher))
            .crawl(
                vec![
                    CandidateSite::new("not a url"),
                    CandidateSite::new("https://ok.example/"),
                ],
                1,
            )
            .await
            .unwrap();

        assert_eq!(report.sites_visited, 1);
        assert_eq!(report.sites_failed, 1);
        assert_eq!(report.failures[0].kind, ErrorKind::InvalidUrl);
    }

    #[tokio::test]
    async fn test_cross_site_dedup() {
        let fetcher = FixtureFetcher::default()
            .page("https://a.example/", "shared@partner.example")
            .page("https://b.example/", "shared@partner.example other@b.example");
        let mut config = test_config();
        config.crawler.workers = 1;

        let report = Coordinator::with_fetcher(config, Arc::new(fetcher))
            .crawl(
                vec![
                    CandidateSite::new("https://a.example/"),
                    CandidateSite::new("https://b.example/"),
                ],
                1,
            )
            .await
            .unwrap();

        assert_eq!(report.email_count(), 2);
        assert_eq!(
            report.records["shared@partner.example"].source_url,
            "https://a.example/"
        );
    }

    #[tokio::test]
    async fn test_deterministic_report() {
        let run = || async {
            let (fetcher, candidates) = site_fixture(12);
            Coordinator::with_fetcher(test_config(), Arc::new(fetcher))
                .crawl(candidates, 2)
                .await
                .unwrap()
        };

        let first = run().await;
        let second = run().await;
        assert_eq!(first.records, second.records);
        assert_eq!(first.sites_visited, second.sites_visited);
        assert_eq!(first.sites_failed, second.sites_failed);
    }

    #[tokio::test]
    async fn test_progress_reported_per_site() {
        let (fetcher, candidates) = site_fixture(6);
        let calls = Arc::new(AtomicUsize::new(0));
        let last_total = Arc::new(AtomicUsize::new(0));

        let observer = {
            let calls = calls.clone();
            let last_total = last_total.clone();
            move |p: &CrawlProgress| {
                calls.fetch_add(1, Ordering::SeqCst);
                last_total.store(p.total, Ordering::SeqCst);
            }
        };

        Coordinator::with_fetcher(test_config(), Arc::new(fetcher))
            .with_progress(Arc::new(observer))
            .crawl(candidates, 1)
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 6);
        assert_eq!(last_total.load(Ordering::SeqCst), 6);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_all_sites() {
        let (fetcher, candidates) = site_fixture(8);
        let fetcher = Arc::new(fetcher);
        let coordinator = Coordinator::with_fetcher(test_config(), fetcher.clone());
        coordinator.cancellation_token().cancel();

        let report = coordinator.crawl(candidates, 1).await.unwrap();

        assert_eq!(report.sites_attempted(), 0);
        assert_eq!(report.sites_skipped, 8);
        assert!(report.cancelled);
        assert!(fetcher.requests().is_empty());
    }

    #[tokio::test]
    async fn test_crawl_timeout_stops_new_sites() {
        let (fetcher, candidates) = site_fixture(6);
        let fetcher = Arc::new(fetcher.latency(Duration::from_millis(700)));
        let mut config = test_config();
        config.crawler.workers = 1;
        config.crawler.crawl_timeout_secs = Some(1);

        let report = Coordinator::with_fetcher(config, fetcher.clone())
            .crawl(candidates, 1)
            .await
            .unwrap();

        // first site ends at 0.7s, the second is in flight at 1s and finishes
        assert!(report.cancelled);
        assert_eq!(report.sites_attempted(), 2);
        assert_eq!(report.sites_skipped, 4);
        assert_eq!(fetcher.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_workers_share_host_delay() {
        let fetcher = FixtureFetcher::default()
            .page("https://shared.example/a", "a@shared.example")
            .page("https://shared.example/b", "b@shared.example");
        let mut config = test_config();
        config.crawler.workers = 2;
        config.crawler.min_host_delay_ms = 250;

        let start = std::time::Instant::now();
        let report = Coordinator::with_fetcher(config, Arc::new(fetcher))
            .crawl(
                vec![
                    CandidateSite::new("https://shared.example/a"),
                    CandidateSite::new("https://shared.example/b"),
                ],
                1,
            )
            .await
            .unwrap();

        assert_eq!(report.email_count(), 2);
        assert!(start.elapsed() >= Duration::from_millis(250));
    }

    #[tokio::test]
    async fn test_workers_on_different_hosts_do_not_wait() {
        let fetcher = FixtureFetcher::default()
            .page("https://one.example/", "a@one.example")
            .page("https://two.example/", "b@two.example");
        let mut config = test_config();
        config.crawler.workers = 2;
        config.crawler.min_host_delay_ms = 5_000;

        let start = std::time::Instant::now();
        let report = Coordinator::with_fetcher(config, Arc::new(fetcher))
            .crawl(
                vec![
                    CandidateSite::new("https://one.example/"),
                    CandidateSite::new("https://two.example/"),
                ],
                1,
            )
            .await
            .unwrap();

        assert_eq!(report.sites_visited, 2);
        assert!(start.elapsed() < Duration::from_secs(2));
    }
}
