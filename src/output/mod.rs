//! Output module for presenting crawl results
//!
//! This module handles:
//! - Printing discovered addresses grouped by the page they were found on
//! - Printing crawl statistics (and failed sites in debug mode)
//! - Writing a markdown report file

mod console;
mod markdown;

pub use console::{format_results, format_statistics, print_results, print_statistics};
pub use markdown::{format_markdown_report, write_markdown_report};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Report path is a directory: {0}")]
    NotAFile(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Run details shown alongside the results
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    /// Search query, if the candidates came from a search
    pub query: Option<String>,

    /// SHA-256 of the configuration file contents
    pub config_hash: String,

    /// Include failed sites with reasons
    pub debug: bool,
}
