use crate::types::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// HTTP fetch settings shared by all source adapters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "news-relay/0.1".to_string(),
            timeout_seconds: 10,
            max_retries: 2,
            retry_delay_seconds: 2,
        }
    }
}

/// Declarative description of one registered source. The registry is built
/// from these at startup; there is no ambient global source lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceSpec {
    /// RSS or Atom feed.
    Rss { key: String, url: String },
    /// HTML page scraped with a CSS selector for article links.
    HtmlPage {
        key: String,
        url: String,
        link_selector: String,
        #[serde(default = "default_min_headline_len")]
        min_headline_len: usize,
        /// Optional regex stripped from the front of each headline
        /// (site boilerplate such as a leading date).
        #[serde(default)]
        headline_strip: Option<String>,
    },
    /// NewsAPI-style JSON endpoint.
    NewsApi {
        key: String,
        endpoint: String,
        api_key: String,
        query: String,
        #[serde(default = "default_page_size")]
        page_size: u32,
    },
}

fn default_min_headline_len() -> usize {
    10
}

fn default_page_size() -> u32 {
    20
}

impl SourceSpec {
    pub fn key(&self) -> &str {
        match self {
            SourceSpec::Rss { key, .. } => key,
            SourceSpec::HtmlPage { key, .. } => key,
            SourceSpec::NewsApi { key, .. } => key,
        }
    }
}

/// Label ids applied after a successful submission, keyed by the headline
/// classifier's categories. Absent ids disable that category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelIds {
    pub violence: Option<String>,
    pub fire: Option<String>,
    pub homelessness: Option<String>,
}

/// External publish platform settings. The token is required; construction
/// of the platform client fails fast without it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub user_agent: String,
    pub labels: LabelIds,
}

/// Settings consumed by the publish driver.
#[derive(Debug, Clone)]
pub struct PublishConfig {
    /// Minimum delay between successive successful submissions.
    pub post_delay: Duration,
    pub max_title_len: usize,
    pub labels: LabelIds,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            post_delay: Duration::from_secs(2),
            max_title_len: 300,
            labels: LabelIds::default(),
        }
    }
}

/// Top-level configuration, loaded explicitly from a JSON file by the
/// binary. The library itself never reads the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub database_path: String,
    pub sources: Vec<SourceSpec>,
    pub blocked_sources: Vec<String>,
    pub blocked_domains: Vec<String>,
    pub post_delay_secs: u64,
    pub max_title_len: usize,
    pub publish_limit: usize,
    pub fetch_timeout_secs: u64,
    pub fetch: FetchConfig,
    pub platform: PlatformConfig,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            database_path: "news_relay.db".to_string(),
            sources: Vec::new(),
            blocked_sources: Vec::new(),
            blocked_domains: Vec::new(),
            post_delay_secs: 2,
            max_title_len: 300,
            publish_limit: 5,
            fetch_timeout_secs: 10,
            fetch: FetchConfig::default(),
            platform: PlatformConfig::default(),
        }
    }
}

impl RelayConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config = serde_json::from_str(&raw)?;
        Ok(config)
    }

    pub fn publish_config(&self) -> PublishConfig {
        PublishConfig {
            post_delay: Duration::from_secs(self.post_delay_secs),
            max_title_len: self.max_title_len,
            labels: self.platform.labels.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_specs_round_trip_through_json() {
        let json = r#"{
            "sources": [
                {"kind": "rss", "key": "rss:wuky", "url": "https://example.org/news.rss"},
                {"kind": "html_page", "key": "city_gov", "url": "https://example.gov/news",
                 "link_selector": "div.row a", "headline_strip": "^\\w{3,4} \\d{1,2}, \\d{4}\\s*"},
                {"kind": "news_api", "key": "newsapi", "endpoint": "https://newsapi.example/v2/everything",
                 "api_key": "k", "query": "Lexington Kentucky"}
            ],
            "blocked_sources": ["central_bank"]
        }"#;
        let config: RelayConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.sources.len(), 3);
        assert_eq!(config.sources[0].key(), "rss:wuky");
        assert_eq!(config.blocked_sources, vec!["central_bank".to_string()]);
        assert_eq!(config.publish_limit, 5);
        match &config.sources[2] {
            SourceSpec::NewsApi { page_size, .. } => assert_eq!(*page_size, 20),
            other => panic!("unexpected spec: {other:?}"),
        }
    }
}
