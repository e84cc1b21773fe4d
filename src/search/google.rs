use super::{SearchError, SearchHit, SearchProvider};
use crate::config::{read_credential, SearchConfig};
use crate::ConfigError;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Results per page served by the Custom Search API
const PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    link: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
}

/// Google Custom Search JSON API client.
///
/// Requires an API key and a programmable search engine id.
pub struct GoogleSearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    engine_id: String,
    page_delay: Duration,
}

impl GoogleSearch {
    pub fn new(
        client: reqwest::Client,
        config: &SearchConfig,
        api_key: String,
        engine_id: String,
    ) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key,
            engine_id,
            page_delay: Duration::from_millis(config.page_delay_ms),
        }
    }

    /// Reads the credentials from the environment variables named in `config`
    ///
    /// # Errors
    ///
    /// * `ConfigError::MissingCredential` - a variable is unset or empty
    pub fn from_env(client: reqwest::Client, config: &SearchConfig) -> Result<Self, ConfigError> {
        let api_key = read_credential(&config.api_key_env)?;
        let engine_id = read_credential(&config.engine_id_env)?;
        Ok(Self::new(client, config, api_key, engine_id))
    }

    async fn fetch_page(&self, query: &str, start: u32) -> Result<Vec<SearchItem>, SearchError> {
        let start = start.to_string();
        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.engine_id.as_str()),
                ("q", query),
                ("start", start.as_str()),
            ])
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();

            return Err(match status.as_u16() {
                429 => SearchError::RateLimit,
                code => SearchError::Api {
                    status: code,
                    message: error_text,
                },
            });
        }

        let body: SearchResponse = resp.json().await?;
        Ok(body.items)
    }
}

#[async_trait]
impl SearchProvider for GoogleSearch {
    async fn search(&self, query: &str, pages: u32) -> Result<Vec<SearchHit>, SearchError> {
        let mut hits = Vec::new();

        for page in 0..pages {
            if page > 0 {
                tokio::time::sleep(self.page_delay).await;
            }

            let start = page * PAGE_SIZE + 1;
            tracing::debug!(query, start, "Requesting search results page");
            let items = self.fetch_page(query, start).await?;

            if items.is_empty() {
                tracing::debug!("No more search results after page {}", page + 1);
                break;
            }

            hits.extend(items.into_iter().map(|item| SearchHit {
                url: item.link,
                title: item.title,
                snippet: item.snippet,
            }));
        }

        Ok(hits)
    }

    fn name(&self) -> &str {
        "Google Custom Search"
    }
}
