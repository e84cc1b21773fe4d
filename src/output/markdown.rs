//! Markdown report generation
//!
//! This module generates a markdown report of a crawl, including run
//! information, statistics, discovered addresses and (in debug mode) failed
//! sites.

use super::{OutputError, OutputResult, ReportContext};
use crate::crawler::CrawlReport;
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

/// Writes the markdown report to `output_path`, creating parent directories
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote the report
/// * `Err(OutputError)` - Failed to write the report
pub fn write_markdown_report(
    report: &CrawlReport,
    context: &ReportContext,
    output_path: &Path,
) -> OutputResult<()> {
    if output_path.is_dir() {
        return Err(OutputError::NotAFile(output_path.display().to_string()));
    }

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    fs::write(output_path, format_markdown_report(report, context))?;
    tracing::info!("Report written to {}", output_path.display());
    Ok(())
}

/// Formats a crawl report as markdown
pub fn format_markdown_report(report: &CrawlReport, context: &ReportContext) -> String {
    let mut md = String::new();

    md.push_str("# Contact-Harvest Report\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    if let Some(query) = &context.query {
        let _ = writeln!(md, "- **Query**: {}", query);
    }
    let _ = writeln!(md, "- **Started**: {}", report.started_at.to_rfc3339());
    if let Some(finished) = report.finished_at {
        let _ = writeln!(md, "- **Finished**: {}", finished.to_rfc3339());
    }
    if let Some(duration) = report.duration() {
        let _ = writeln!(md, "- **Duration**: {} seconds", duration.num_seconds());
    }
    let status = if report.cancelled { "cancelled" } else { "completed" };
    let _ = writeln!(md, "- **Status**: {}", status);
    let _ = writeln!(md, "- **Config Hash**: {}\n", context.config_hash);

    // Statistics
    md.push_str("## Statistics\n\n");
    md.push_str("| Metric | Count |\n");
    md.push_str("|--------|-------|\n");
    let _ = writeln!(md, "| Candidate sites | {} |", report.sites_total);
    let _ = writeln!(md, "| Sites visited | {} |", report.sites_visited);
    let _ = writeln!(md, "| Sites failed | {} |", report.sites_failed);
    let _ = writeln!(md, "| Sites skipped | {} |", report.sites_skipped);
    let _ = writeln!(md, "| Contact pages found | {} |", report.contact_pages_found);
    let _ = writeln!(md, "| Pages fetched | {} |", report.pages_fetched);
    let _ = writeln!(md, "| Unique addresses | {} |\n", report.email_count());

    // Addresses
    md.push_str("## Email Addresses\n\n");
    if report.records.is_empty() {
        md.push_str("No email addresses found.\n\n");
    } else {
        md.push_str("| Address | Source |\n");
        md.push_str("|---------|--------|\n");
        for record in report.emails() {
            let sources: Vec<&str> = record.sources().collect();
            let _ = writeln!(md, "| {} | {} |", record.address, sources.join("<br>"));
        }
        md.push('\n');
    }

    // Failed sites
    if context.debug && !report.failures.is_empty() {
        md.push_str("## Failed Sites\n\n");
        md.push_str("| Site | Reason | Detail |\n");
        md.push_str("|------|--------|--------|\n");
        for failure in &report.failures {
            let _ = writeln!(
                md,
                "| {} | {} | {} |",
                failure.site_url,
                failure.kind,
                failure.message.replace('|', "\\|")
            );
        }
        md.push('\n');
    }

    md
}
