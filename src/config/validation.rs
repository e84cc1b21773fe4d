use crate::config::types::{
    Config, ContactConfig, CrawlerConfig, OutputConfig, SearchConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_contact_config(&config.contacts)?;
    validate_search_config(&config.search)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.workers < 1 || config.workers > 64 {
        return Err(ConfigError::Validation(format!(
            "workers must be between 1 and 64, got {}",
            config.workers
        )));
    }

    if config.results_per_page < 1 {
        return Err(ConfigError::Validation(format!(
            "results_per_page must be >= 1, got {}",
            config.results_per_page
        )));
    }

    if config.max_contact_links < 1 {
        return Err(ConfigError::Validation(format!(
            "max_contact_links must be >= 1, got {}",
            config.max_contact_links
        )));
    }

    if config.request_timeout_ms < 100 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_ms must be >= 100ms, got {}ms",
            config.request_timeout_ms
        )));
    }

    if config.max_retries > 10 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 10, got {}",
            config.max_retries
        )));
    }

    if config.crawl_timeout_secs == Some(0) {
        return Err(ConfigError::Validation(
            "crawl_timeout_secs must be > 0 when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.value.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user agent cannot be empty".to_string(),
        ));
    }

    if config.value.chars().any(|c| c.is_control()) {
        return Err(ConfigError::Validation(
            "user agent cannot contain control characters".to_string(),
        ));
    }

    Ok(())
}

/// Validates contact keyword configuration
fn validate_contact_config(config: &ContactConfig) -> Result<(), ConfigError> {
    if config.keywords.is_empty() {
        return Err(ConfigError::Validation(
            "contact keywords cannot be empty".to_string(),
        ));
    }

    if let Some(blank) = config.keywords.iter().find(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(format!(
            "contact keywords cannot contain blank entries, got '{}'",
            blank
        )));
    }

    Ok(())
}

/// Validates search provider configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.endpoint)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search endpoint: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "Search endpoint '{}' must use HTTP or HTTPS",
            config.endpoint
        )));
    }

    validate_env_name(&config.api_key_env)?;
    validate_env_name(&config.engine_id_env)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.log_dir.is_empty() {
        return Err(ConfigError::Validation("log_dir cannot be empty".to_string()));
    }

    if matches!(config.report_path.as_deref(), Some("")) {
        return Err(ConfigError::Validation(
            "report_path cannot be empty when set".to_string(),
        ));
    }

    Ok(())
}

/// Validates an environment variable name
fn validate_env_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::Validation(
            "environment variable name cannot be empty".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ConfigError::Validation(format!(
            "environment variable name '{}' may only contain A-Z, 0-9 and '_'",
            name
        )));
    }

    Ok(())
}
