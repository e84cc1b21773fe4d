//! Human-readable results on stdout

use crate::crawler::CrawlReport;
use std::fmt::Write;

/// Formats discovered addresses grouped by source page
///
/// ```text
/// URL: https://example.com/contact
/// Emails: hr@example.com, sales@example.com
/// ```
pub fn format_results(report: &CrawlReport) -> String {
    if report.records.is_empty() {
        return "No email addresses found.\n".to_string();
    }

    let mut out = String::from("Found email addresses:\n");
    for (source, addresses) in report.by_source() {
        let _ = write!(out, "\nURL: {}\nEmails: {}\n", source, addresses.join(", "));
    }
    out
}

/// Prints discovered addresses to stdout
pub fn print_results(report: &CrawlReport) {
    print!("{}", format_results(report));
}

/// Formats crawl statistics; failed sites are listed when `debug` is set
pub fn format_statistics(report: &CrawlReport, debug: bool) -> String {
    let mut out = String::from("=== Crawl Statistics ===\n\n");

    let _ = writeln!(out, "  Candidate sites: {}", report.sites_total);
    let _ = writeln!(out, "  Sites visited: {}", report.sites_visited);
    let _ = writeln!(out, "  Sites failed: {}", report.sites_failed);
    if report.sites_skipped > 0 {
        let _ = writeln!(out, "  Sites skipped (cancelled): {}", report.sites_skipped);
    }
    let _ = writeln!(out, "  Contact pages found: {}", report.contact_pages_found);
    let _ = writeln!(out, "  Pages fetched: {}", report.pages_fetched);
    let _ = writeln!(out, "  Unique addresses: {}", report.email_count());
    if let Some(duration) = report.duration() {
        let _ = writeln!(
            out,
            "  Duration: {:.1}s",
            duration.num_milliseconds() as f64 / 1000.0
        );
    }

    if debug && !report.failures.is_empty() {
        let _ = writeln!(out, "\nFailed Sites ({}):", report.failures.len());
        for failure in &report.failures {
            let _ = writeln!(
                out,
                "  - {} [{}] {}",
                failure.site_url, failure.kind, failure.message
            );
        }
    }

    out
}

/// Prints crawl statistics to stdout
pub fn print_statistics(report: &CrawlReport, debug: bool) {
    println!();
    print!("{}", format_statistics(report, debug));
}
