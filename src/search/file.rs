use super::{SearchError, SearchHit, SearchProvider};
use async_trait::async_trait;
use std::path::PathBuf;

/// Candidate list read from a text file, one URL per line
///
/// Blank lines and lines starting with `#` are skipped. The query is ignored;
/// the coordinator applies the page cap.
#[derive(Debug, Clone)]
pub struct FileCandidates {
    path: PathBuf,
}

impl FileCandidates {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

/// Parses candidate lines
fn parse_lines(content: &str) -> Vec<SearchHit> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(SearchHit::new)
        .collect()
}

#[async_trait]
impl SearchProvider for FileCandidates {
    async fn search(&self, _query: &str, _pages: u32) -> Result<Vec<SearchHit>, SearchError> {
        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(parse_lines(&content))
    }

    fn name(&self) -> &str {
        "candidate file"
    }
}
