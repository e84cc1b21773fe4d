//! Configuration module for Contact-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! A configuration file is optional; every setting has a default.
//!
//! # Example
//!
//! ```no_run
//! use contact_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Crawler will use {} workers", config.crawler.workers);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    Config, ContactConfig, CrawlerConfig, OutputConfig, SearchConfig, SourcePolicy,
    UserAgentConfig,
};

// Re-export parser functions
pub use parser::{
    compute_config_hash, hash_content, load_config, load_config_with_hash, parse_config,
    read_credential,
};
