use crate::fetcher::Fetcher;
use crate::sources::SourceAdapter;
use crate::types::{RawCandidate, RelayError, Result};
use async_trait::async_trait;
use feed_rs::parser;
use std::sync::Arc;
use tracing::{debug, info};

/// Adapter for RSS and Atom feeds.
pub struct RssFeedSource {
    key: String,
    url: String,
    fetcher: Arc<Fetcher>,
}

impl RssFeedSource {
    pub fn new(key: String, url: String, fetcher: Arc<Fetcher>) -> Self {
        Self { key, url, fetcher }
    }

    /// Parse feed XML into candidates. Split out from the fetch so it can
    /// be exercised on static content.
    pub fn parse_content(content: &str) -> Result<Vec<RawCandidate>> {
        let feed = parser::parse(content.as_bytes())
            .map_err(|e| RelayError::Parse(format!("failed to parse feed: {e}")))?;

        let mut candidates = Vec::new();
        for entry in feed.entries {
            let url = match entry.links.first() {
                Some(link) => link.href.clone(),
                None => {
                    debug!("Skipping feed entry without a link");
                    continue;
                }
            };
            let headline = match entry.title {
                Some(title) => title.content.trim().to_string(),
                None => {
                    debug!("Skipping feed entry without a title: {}", url);
                    continue;
                }
            };
            let summary = entry
                .summary
                .map(|s| s.content.trim().to_string())
                .unwrap_or_default();
            let published_raw = entry.published.map(|dt| dt.to_rfc3339());

            candidates.push(RawCandidate {
                url,
                headline,
                summary,
                published_raw,
                source_label: None,
            });
        }

        Ok(candidates)
    }
}

#[async_trait]
impl SourceAdapter for RssFeedSource {
    fn key(&self) -> &str {
        &self.key
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        let content = self.fetcher.fetch_text(&self.url).await?;
        let candidates = Self::parse_content(&content)?;
        info!("{}: {} entries", self.key, candidates.len());
        Ok(candidates)
    }
}
