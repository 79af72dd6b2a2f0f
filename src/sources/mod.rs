pub mod html_page;
pub mod json_api;
pub mod rss_feed;

pub use html_page::HtmlPageSource;
pub use json_api::NewsApiSource;
pub use rss_feed::RssFeedSource;

use crate::config::SourceSpec;
use crate::fetcher::Fetcher;
use crate::types::{RawCandidate, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One named origin of news content. Adapters own the site-specific
/// fetching and cleanup; the orchestrator only depends on this contract.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Short key identifying this source (e.g. "rss:wuky").
    fn key(&self) -> &str;

    /// Fetch raw content and yield zero or more candidate entries with
    /// already-clean headline and url fields.
    async fn fetch(&self) -> Result<Vec<RawCandidate>>;
}

/// Explicit mapping from source key to adapter, passed into the
/// orchestrator at construction. Iteration order is the key order, so
/// ingestion runs are deterministic.
#[derive(Default)]
pub struct SourceRegistry {
    adapters: BTreeMap<String, Box<dyn SourceAdapter>>,
}

impl SourceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Box<dyn SourceAdapter>) {
        self.adapters.insert(adapter.key().to_string(), adapter);
    }

    pub fn get(&self, key: &str) -> Option<&dyn SourceAdapter> {
        self.adapters.get(key).map(|a| a.as_ref())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &dyn SourceAdapter)> {
        self.adapters.iter().map(|(k, a)| (k.as_str(), a.as_ref()))
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    /// Build a registry from declarative source specs, sharing one fetcher
    /// across all adapters.
    pub fn from_specs(specs: &[SourceSpec], fetcher: Arc<Fetcher>) -> Result<Self> {
        let mut registry = Self::new();
        for spec in specs {
            match spec {
                SourceSpec::Rss { key, url } => {
                    registry.register(Box::new(RssFeedSource::new(
                        key.clone(),
                        url.clone(),
                        fetcher.clone(),
                    )));
                }
                SourceSpec::HtmlPage {
                    key,
                    url,
                    link_selector,
                    min_headline_len,
                    headline_strip,
                } => {
                    registry.register(Box::new(HtmlPageSource::new(
                        key.clone(),
                        url.clone(),
                        link_selector.clone(),
                        *min_headline_len,
                        headline_strip.as_deref(),
                        fetcher.clone(),
                    )?));
                }
                SourceSpec::NewsApi {
                    key,
                    endpoint,
                    api_key,
                    query,
                    page_size,
                } => {
                    registry.register(Box::new(NewsApiSource::new(
                        key.clone(),
                        endpoint.clone(),
                        api_key.clone(),
                        query.clone(),
                        *page_size,
                        fetcher.clone(),
                    )));
                }
            }
        }
        Ok(registry)
    }
}
