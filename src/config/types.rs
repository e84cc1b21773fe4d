use serde::Deserialize;

/// Main configuration structure for Contact-Harvest
///
/// Every section is optional in the TOML file; missing sections and keys
/// fall back to the defaults below.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub contacts: ContactConfig,
    pub search: SearchConfig,
    pub output: OutputConfig,
}

/// Which source URLs an email record keeps when found on several pages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourcePolicy {
    /// Keep only the first page the address was seen on
    #[default]
    FirstSource,
    /// Keep every page the address was seen on
    AllSources,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of sites crawled concurrently
    pub workers: u32,

    /// Number of candidate sites per page of search results
    #[serde(rename = "results-per-page")]
    pub results_per_page: u32,

    /// Maximum number of contact links followed per site
    #[serde(rename = "max-contact-links")]
    pub max_contact_links: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Retries for transient failures after the first attempt
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Base backoff between retries, doubled after each attempt (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "min-host-delay-ms")]
    pub min_host_delay_ms: u64,

    /// Global crawl timeout; no new site is started once it elapses
    #[serde(rename = "crawl-timeout-secs")]
    pub crawl_timeout_secs: Option<u64>,

    /// Source tracking for addresses found on several pages
    #[serde(rename = "source-policy")]
    pub source_policy: SourcePolicy,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            workers: 5,
            results_per_page: 10,
            max_contact_links: 3,
            request_timeout_ms: 10_000,
            max_retries: 2,
            retry_backoff_ms: 500,
            min_host_delay_ms: 1_000,
            crawl_timeout_secs: None,
            source_policy: SourcePolicy::FirstSource,
        }
    }
}

/// User agent sent with every page request
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    pub value: String,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            value: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                    (KHTML, like Gecko) Chrome/120.0 Safari/537.36"
                .to_string(),
        }
    }
}

/// Contact-page detection configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContactConfig {
    /// Case-insensitive keywords matched against link text and path
    pub keywords: Vec<String>,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            keywords: [
                "contact",
                "about",
                "team",
                "staff",
                "directory",
                "about-us",
                "reach us",
                "get in touch",
            ]
            .iter()
            .map(|k| k.to_string())
            .collect(),
        }
    }
}

/// Search provider configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Google Custom Search JSON API endpoint
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Environment variable holding the search engine ID
    #[serde(rename = "engine-id-env")]
    pub engine_id_env: String,

    /// Delay between result page requests (milliseconds)
    #[serde(rename = "page-delay-ms")]
    pub page_delay_ms: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            engine_id_env: "GOOGLE_CSE_ID".to_string(),
            page_delay_ms: 1_000,
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory receiving the rolling log files
    #[serde(rename = "log-dir")]
    pub log_dir: String,

    /// Path of the markdown report, if one should be written
    #[serde(rename = "report-path")]
    pub report_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_dir: "logs".to_string(),
            report_path: None,
        }
    }
}
