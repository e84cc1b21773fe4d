//! Contact-Harvest main entry point
//!
//! This is the command-line interface: search (or read a URL list), crawl
//! the candidate sites, print the discovered addresses.

use anyhow::Context;
use clap::Parser;
use contact_harvest::config::{load_config_with_hash, Config};
use contact_harvest::crawler::{build_http_client, CandidateSite, Coordinator};
use contact_harvest::output::{self, ReportContext};
use contact_harvest::search::{collect_candidates, FileCandidates, GoogleSearch};
use dialoguer::{theme::ColorfulTheme, Confirm, Input};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Contact-Harvest: finds published email addresses on websites
///
/// Runs a web search for QUERY, visits each result's home page and a few
/// of its contact/about pages, and lists every email address found along
/// with the page it appeared on.
///
/// Without QUERY and --urls the run is interactive: the query, the number of
/// result pages and debug mode are prompted for, defaulting to the flags.
#[derive(Parser, Debug)]
#[command(name = "contact-harvest")]
#[command(version = "1.0.0")]
#[command(about = "Finds published email addresses on websites", long_about = None)]
struct Cli {
    /// Search query; when omitted without --urls, the query, page count and
    /// debug mode are prompted for interactively
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Number of search result pages to crawl
    #[arg(short, long, default_value_t = 2)]
    pages: u32,

    /// Debug output: verbose logs and failed sites with reasons
    #[arg(long)]
    debug: bool,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Crawl the URLs listed in FILE instead of searching
    #[arg(long, value_name = "FILE")]
    urls: Option<PathBuf>,

    /// Directory for log files (overrides the config)
    #[arg(long, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Write a markdown report to FILE (overrides the config)
    #[arg(long, value_name = "FILE")]
    report: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();
    dotenvy::dotenv().ok();

    if cli.query.is_none() && cli.urls.is_none() {
        prompt_run_options(&mut cli)?;
    }

    let (mut config, config_hash) = load_config_with_hash(cli.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(dir) = &cli.log_dir {
        config.output.log_dir = dir.display().to_string();
    }
    if let Some(report) = &cli.report {
        config.output.report_path = Some(report.display().to_string());
    }

    let _guard = setup_logging(Path::new(&config.output.log_dir), &cli)?;
    tracing::info!("Configuration loaded (hash: {})", config_hash);

    let (candidates, query) = gather_candidates(&cli, &config).await?;

    let coordinator = Coordinator::new(config.clone())?;
    let cancel = coordinator.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing sites in progress");
            cancel.cancel();
        }
    });

    let report = coordinator
        .crawl(candidates, cli.pages)
        .await
        .context("Crawl failed")?;

    output::print_results(&report);
    if !cli.quiet {
        output::print_statistics(&report, cli.debug);
    }

    if let Some(path) = &config.output.report_path {
        let context = ReportContext {
            query,
            config_hash,
            debug: cli.debug,
        };
        output::write_markdown_report(&report, &context, Path::new(path))
            .context("Failed to write report")?;
    }

    Ok(())
}

/// Asks for the query, page count and debug mode on the terminal
///
/// Current flag values are offered as defaults.
fn prompt_run_options(cli: &mut Cli) -> anyhow::Result<()> {
    let theme = ColorfulTheme::default();

    let query = Input::<String>::with_theme(&theme)
        .with_prompt("Enter your search query")
        .interact_text()
        .context("Failed to read search query")?;
    let pages = Input::<u32>::with_theme(&theme)
        .with_prompt("Number of result pages to crawl")
        .default(cli.pages)
        .interact_text()
        .context("Failed to read page count")?;
    let debug = Confirm::with_theme(&theme)
        .with_prompt("Enable debug output?")
        .default(cli.debug)
        .interact()
        .context("Failed to read debug choice")?;

    cli.query = Some(query);
    cli.pages = pages;
    cli.debug = debug;
    Ok(())
}

/// Sets up stderr logging plus a daily-rolling log file in `log_dir`
///
/// The returned guard flushes the file writer when dropped.
fn setup_logging(log_dir: &Path, cli: &Cli) -> anyhow::Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("failed to create log directory: {}", log_dir.display()))?;

    let level = if cli.quiet {
        "error"
    } else if cli.debug {
        match cli.verbose {
            0 | 1 => "contact_harvest=debug,info",
            _ => "contact_harvest=trace,debug",
        }
    } else {
        match cli.verbose {
            0 => "contact_harvest=info,warn",
            1 => "contact_harvest=debug,info",
            2 => "contact_harvest=trace,debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let appender = tracing_appender::rolling::daily(log_dir, "contact-harvest.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .try_init()
        .map_err(|e| anyhow::anyhow!("tracing setup failed: {e}"))?;

    Ok(guard)
}

/// Collects candidate sites from the URL file or a web search
///
/// Returns the query used, if any, for the report.
async fn gather_candidates(
    cli: &Cli,
    config: &Config,
) -> anyhow::Result<(Vec<CandidateSite>, Option<String>)> {
    if let Some(path) = &cli.urls {
        let provider = FileCandidates::new(path);
        let candidates = collect_candidates(&provider, cli.query.as_deref().unwrap_or(""), cli.pages)
            .await
            .with_context(|| format!("Failed to read candidates from {}", path.display()))?;
        return Ok((candidates, cli.query.clone()));
    }

    let query = cli
        .query
        .clone()
        .context("No search query given (pass QUERY or --urls FILE)")?;

    let client = build_http_client(&config.user_agent, &config.crawler)?;
    let provider = GoogleSearch::from_env(client, &config.search)
        .context("Search credentials missing (set them in the environment or a .env file)")?;
    let candidates = collect_candidates(&provider, &query, cli.pages)
        .await
        .context("Search failed")?;

    Ok((candidates, Some(query)))
}
