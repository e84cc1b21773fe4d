//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use contact_harvest::config::Config;
use contact_harvest::crawler::{FetchOutcome, HttpFetcher, PageFetcher};
use contact_harvest::{CandidateSite, Coordinator, CrawlReport, ErrorKind, HarvestError};
use std::time::{Duration, Instant};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration with short delays
fn create_test_config() -> Config {
    let mut config = Config::default();
    config.crawler.workers = 5;
    config.crawler.request_timeout_ms = 2_000;
    config.crawler.max_retries = 2;
    config.crawler.retry_backoff_ms = 10;
    config.crawler.min_host_delay_ms = 0;
    config.user_agent.value = "TestBot/1.0".to_string();
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html",
    )
}

async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(html(body))
        .mount(server)
        .await;
}

fn test_fetcher(config: &Config) -> HttpFetcher {
    HttpFetcher::from_config(&config.user_agent, &config.crawler).expect("client builds")
}

#[tokio::test]
async fn test_home_and_contact_page_emails() {
    let server = MockServer::start().await;
    let base_url = server.uri();

    mount_page(
        &server,
        "/",
        r#"<p>Email us at Info@Example.com!</p><a href="/contact">Contact Us</a>"#,
    )
    .await;
    mount_page(&server, "/contact", "<p>Sales: sales@example.com</p>").await;

    let report = Coordinator::new(create_test_config())
        .expect("coordinator builds")
        .crawl(vec![CandidateSite::new(base_url.clone())], 1)
        .await
        .expect("crawl succeeds");

    assert_eq!(report.sites_visited, 1);
    assert_eq!(report.sites_failed, 0);
    assert_eq!(report.contact_pages_found, 1);
    assert_eq!(report.email_count(), 2);
    assert_eq!(
        report.records["info@example.com"].source_url,
        format!("{}/", base_url)
    );
    assert_eq!(
        report.records["sales@example.com"].source_url,
        format!("{}/contact", base_url)
    );
}

#[tokio::test]
async fn test_mailto_links_are_found() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"<a href="mailto:Office@Example.org?subject=Hello">Write to us</a>"#,
    )
    .await;

    let report = Coordinator::new(create_test_config())
        .unwrap()
        .crawl(vec![CandidateSite::new(server.uri())], 1)
        .await
        .unwrap();

    assert!(report.records.contains_key("office@example.org"));
}

#[tokio::test]
async fn test_home_failure_skips_contact_pages() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(html("never@example.com"))
        .expect(0)
        .mount(&server)
        .await;

    let report = Coordinator::new(create_test_config())
        .unwrap()
        .crawl(vec![CandidateSite::new(server.uri())], 1)
        .await
        .unwrap();

    assert_eq!(report.sites_failed, 1);
    assert_eq!(report.sites_visited, 0);
    assert_eq!(report.email_count(), 0);
    assert_eq!(report.failures[0].kind, ErrorKind::HttpError(404));
}

#[tokio::test]
async fn test_contact_failure_keeps_home_emails() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"info@example.com <a href="/contact">Contact</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/contact"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let report = Coordinator::new(create_test_config())
        .unwrap()
        .crawl(vec![CandidateSite::new(server.uri())], 1)
        .await
        .unwrap();

    assert_eq!(report.sites_visited, 1);
    assert_eq!(report.sites_failed, 0);
    assert_eq!(report.email_count(), 1);
    assert!(report.records.contains_key("info@example.com"));
}

#[tokio::test]
async fn test_offsite_contact_links_not_followed() {
    let server = MockServer::start().await;
    let other = MockServer::start().await;

    // 127.0.0.1 vs localhost: different registered domains
    let offsite = other.uri().replace("127.0.0.1", "localhost");
    mount_page(
        &server,
        "/",
        &format!(r#"<a href="{}/contact">Contact</a>"#, offsite),
    )
    .await;
    Mock::given(method("GET"))
        .respond_with(html("partner@example.net"))
        .expect(0)
        .mount(&other)
        .await;

    let report = Coordinator::new(create_test_config())
        .unwrap()
        .crawl(vec![CandidateSite::new(server.uri())], 1)
        .await
        .unwrap();

    assert_eq!(report.contact_pages_found, 0);
    assert_eq!(report.email_count(), 0);
}

#[tokio::test]
async fn test_empty_candidates_fail() {
    let result = Coordinator::new(create_test_config())
        .unwrap()
        .crawl(Vec::new(), 2)
        .await;

    assert!(matches!(result, Err(HarvestError::NoCandidates)));
}

#[tokio::test]
async fn test_twenty_sites_five_workers() {
    let server = MockServer::start().await;

    for i in 0..20 {
        let route = format!("/site{}", i);
        if i % 5 == 0 {
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .respond_with(ResponseTemplate::new(410))
                .mount(&server)
                .await;
        } else {
            mount_page(&server, &route, &format!("owner{}@example.com", i)).await;
        }
    }

    let candidates: Vec<CandidateSite> = (0..20)
        .map(|i| CandidateSite::new(format!("{}/site{}", server.uri(), i)))
        .collect();

    let report = Coordinator::new(create_test_config())
        .unwrap()
        .crawl(candidates, 2)
        .await
        .unwrap();

    assert_eq!(report.sites_visited + report.sites_failed, 20);
    assert_eq!(report.sites_failed, 4);
    assert_eq!(report.email_count(), 16);
}

#[tokio::test]
async fn test_same_crawl_twice_is_identical() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        r#"a@example.com <a href="/about">About</a> <a href="/team">Team</a>"#,
    )
    .await;
    mount_page(&server, "/about", "b@example.com a@example.com").await;
    mount_page(&server, "/team", "c@example.com").await;

    let crawl = || async {
        Coordinator::new(create_test_config())
            .unwrap()
            .crawl(vec![CandidateSite::new(server.uri())], 1)
            .await
            .unwrap()
    };

    let first = crawl().await;
    let second = crawl().await;

    assert_eq!(first.records, second.records);
    assert_eq!(first.email_count(), 3);
    assert_eq!(first.contact_pages_found, second.contact_pages_found);
}

async fn crawl_one(config: Config, url: String) -> CrawlReport {
    Coordinator::new(config)
        .unwrap()
        .crawl(vec![CandidateSite::new(url)], 1)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_transient_failure_is_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/flaky", "ok@example.com").await;

    let report = crawl_one(create_test_config(), format!("{}/flaky", server.uri())).await;

    assert_eq!(report.sites_visited, 1);
    assert!(report.records.contains_key("ok@example.com"));
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let report = crawl_one(create_test_config(), format!("{}/missing", server.uri())).await;

    assert_eq!(report.sites_failed, 1);
    assert_eq!(report.failures[0].kind, ErrorKind::HttpError(404));
}

#[tokio::test]
async fn test_retries_are_bounded() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/down"))
        .respond_with(ResponseTemplate::new(502))
        .expect(3)
        .mount(&server)
        .await;

    let report = crawl_one(create_test_config(), format!("{}/down", server.uri())).await;

    assert_eq!(report.sites_failed, 1);
    assert_eq!(report.failures[0].kind, ErrorKind::HttpError(502));
}

#[tokio::test]
async fn test_retries_respect_host_delay() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.min_host_delay_ms = 200;
    config.crawler.retry_backoff_ms = 10;
    config.crawler.max_retries = 2;

    let start = Instant::now();
    let report = crawl_one(config, server.uri()).await;

    assert_eq!(report.sites_failed, 1);
    // three attempts on one host, each waiting for the host delay
    assert!(
        start.elapsed() >= Duration::from_millis(400),
        "retries took only {:?}",
        start.elapsed()
    );
}

#[tokio::test]
async fn test_rate_limited_host_is_slowed_for_later_sites() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/busy"))
        .respond_with(ResponseTemplate::new(429))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/calm", "calm@example.com").await;

    let mut config = create_test_config();
    config.crawler.workers = 1;
    config.crawler.min_host_delay_ms = 150;

    let start = Instant::now();
    let report = Coordinator::new(config)
        .unwrap()
        .crawl(
            vec![
                CandidateSite::new(format!("{}/busy", server.uri())),
                CandidateSite::new(format!("{}/calm", server.uri())),
            ],
            1,
        )
        .await
        .unwrap();

    assert_eq!(report.sites_failed, 1);
    assert_eq!(report.failures[0].kind, ErrorKind::HttpError(429));
    assert!(report.records.contains_key("calm@example.com"));
    // the 429 doubled the 150ms host delay before the second site
    assert!(start.elapsed() >= Duration::from_millis(300));
}

#[tokio::test]
async fn test_timeout_is_classified() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(html("late@example.com").set_delay(Duration::from_millis(800)))
        .mount(&server)
        .await;

    let mut config = create_test_config();
    config.crawler.request_timeout_ms = 200;

    let url = url::Url::parse(&format!("{}/slow", server.uri())).unwrap();
    let result = test_fetcher(&config).fetch(&url).await;

    assert!(matches!(
        result.outcome,
        FetchOutcome::Failure {
            kind: ErrorKind::Timeout,
            ..
        }
    ));
    assert_eq!(result.attempts, 1);
}

#[tokio::test]
async fn test_non_html_content_is_unreadable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/logo.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89, 0x50, 0x4e, 0x47], "image/png"))
        .mount(&server)
        .await;

    let config = create_test_config();
    let url = url::Url::parse(&format!("{}/logo.png", server.uri())).unwrap();
    let result = test_fetcher(&config).fetch(&url).await;

    assert!(matches!(result.outcome, FetchOutcome::Unreadable { .. }));
    assert_eq!(result.error_kind(), None);
}

#[tokio::test]
async fn test_non_html_home_page_counts_as_visited() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"{"email": "api@example.com"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let report = crawl_one(create_test_config(), server.uri()).await;

    assert_eq!(report.sites_visited, 1);
    assert_eq!(report.sites_failed, 0);
    assert_eq!(report.email_count(), 0);
}
