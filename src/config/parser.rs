use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Reads a TOML file and returns the validated configuration
///
/// Sections and keys missing from the file fall back to their defaults, so a
/// file holding only `[crawler]\nworkers = 2` is valid.
///
/// ```no_run
/// use std::path::Path;
/// use contact_harvest::config::load_config;
///
/// let config = load_config(Path::new("harvest.toml")).unwrap();
/// assert!(config.crawler.workers >= 1);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Recorded in logs and reports so two runs can be compared.
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Hex-encoded SHA-256 of arbitrary configuration text
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
///
/// Without a path the defaults are validated and hashed as an empty file.
pub fn load_config_with_hash(path: Option<&Path>) -> Result<(Config, String), ConfigError> {
    match path {
        Some(path) => {
            let config = load_config(path)?;
            let hash = compute_config_hash(path)?;
            Ok((config, hash))
        }
        None => {
            let config = Config::default();
            validate(&config)?;
            Ok((config, hash_content("")))
        }
    }
}

/// Reads a credential from the environment
///
/// `.env` files are honoured when `dotenvy` has been initialised by the
/// caller. Empty values count as missing.
pub fn read_credential(var: &str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
        _ => Err(ConfigError::MissingCredential(var.to_string())),
    }
}
