use crate::fetcher::Fetcher;
use crate::sources::SourceAdapter;
use crate::types::{RawCandidate, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Adapter for NewsAPI-style JSON endpoints. Each article carries its own
/// outlet name, so candidates are tagged "<key>_<outlet>" rather than the
/// bare adapter key.
pub struct NewsApiSource {
    key: String,
    endpoint: String,
    api_key: String,
    query: String,
    page_size: u32,
    fetcher: Arc<Fetcher>,
}

/// Results older than this are not worth relaying.
const LOOKBACK_DAYS: i64 = 7;

#[derive(Debug, Deserialize)]
struct ApiResponse {
    #[serde(default)]
    articles: Vec<ApiArticle>,
}

#[derive(Debug, Deserialize)]
struct ApiArticle {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(rename = "publishedAt")]
    published_at: Option<String>,
    source: Option<ApiOutlet>,
}

#[derive(Debug, Deserialize)]
struct ApiOutlet {
    name: Option<String>,
}

impl NewsApiSource {
    pub fn new(
        key: String,
        endpoint: String,
        api_key: String,
        query: String,
        page_size: u32,
        fetcher: Arc<Fetcher>,
    ) -> Self {
        Self {
            key,
            endpoint,
            api_key,
            query,
            page_size,
            fetcher,
        }
    }

    /// Request parameters, constrained to a one-week lookback window so
    /// stale articles do not resurface on every run.
    fn query_params(&self, now: DateTime<Utc>) -> Vec<(&'static str, String)> {
        let window_start = now - Duration::days(LOOKBACK_DAYS);
        vec![
            ("q", self.query.clone()),
            ("apiKey", self.api_key.clone()),
            ("language", "en".to_string()),
            ("sortBy", "relevancy".to_string()),
            ("pageSize", self.page_size.to_string()),
            ("from", window_start.format("%Y-%m-%d").to_string()),
            ("to", now.format("%Y-%m-%d").to_string()),
        ]
    }

    pub fn parse_content(&self, content: &str) -> Result<Vec<RawCandidate>> {
        let response: ApiResponse = serde_json::from_str(content)?;

        let mut candidates = Vec::new();
        for article in response.articles {
            if article.title.is_empty() || article.url.is_empty() {
                debug!("{}: skipping article without title or url", self.key);
                continue;
            }

            let source_label = article
                .source
                .and_then(|s| s.name)
                .map(|name| format!("{}_{}", self.key, name));

            candidates.push(RawCandidate {
                url: article.url,
                headline: article.title.trim().to_string(),
                summary: article.description.unwrap_or_default(),
                published_raw: article.published_at,
                source_label,
            });
        }

        Ok(candidates)
    }
}

#[async_trait]
impl SourceAdapter for NewsApiSource {
    fn key(&self) -> &str {
        &self.key
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        let query = self.query_params(Utc::now());
        let content = self
            .fetcher
            .fetch_text_with_query(&self.endpoint, &query)
            .await?;
        let candidates = self.parse_content(&content)?;
        info!("{}: {} articles", self.key, candidates.len());
        Ok(candidates)
    }
}
