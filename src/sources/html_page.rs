use crate::fetcher::Fetcher;
use crate::sources::SourceAdapter;
use crate::types::{RawCandidate, RelayError, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::{Html, Selector};
use std::sync::Arc;
use tracing::{debug, info};
use url::Url;

/// Adapter for sites without a feed: scrapes article links off one page
/// with a configured CSS selector. The fragile, presentation-specific part
/// lives entirely in configuration (selector and optional headline strip),
/// so swapping a site means swapping config, not code.
pub struct HtmlPageSource {
    key: String,
    url: String,
    link_selector: Selector,
    min_headline_len: usize,
    headline_strip: Option<Regex>,
    fetcher: Arc<Fetcher>,
}

impl HtmlPageSource {
    pub fn new(
        key: String,
        url: String,
        link_selector: String,
        min_headline_len: usize,
        headline_strip: Option<&str>,
        fetcher: Arc<Fetcher>,
    ) -> Result<Self> {
        let link_selector = Selector::parse(&link_selector)
            .map_err(|e| RelayError::Parse(format!("bad selector for {key}: {e}")))?;
        let headline_strip = headline_strip
            .map(Regex::new)
            .transpose()
            .map_err(|e| RelayError::Parse(format!("bad headline_strip for {key}: {e}")))?;

        Ok(Self {
            key,
            url,
            link_selector,
            min_headline_len,
            headline_strip,
            fetcher,
        })
    }

    /// Extract candidates from page HTML. Scraped pages carry no usable
    /// publication timestamp, so published_raw stays empty and the
    /// orchestrator substitutes ingestion time.
    pub fn parse_content(&self, content: &str) -> Vec<RawCandidate> {
        let base = Url::parse(&self.url).ok();
        let document = Html::parse_document(content);
        let mut candidates = Vec::new();

        for element in document.select(&self.link_selector) {
            let href = match element.value().attr("href") {
                Some(href) => href,
                None => continue,
            };

            let mut headline = element.text().collect::<String>().trim().to_string();
            if let Some(strip) = &self.headline_strip {
                headline = strip.replace(&headline, "").trim().to_string();
            }
            if headline.len() < self.min_headline_len {
                debug!("{}: skipping short headline: {:?}", self.key, headline);
                continue;
            }

            let url = match &base {
                Some(base) => match base.join(href) {
                    Ok(joined) => joined.to_string(),
                    Err(_) => {
                        debug!("{}: skipping unjoinable href: {}", self.key, href);
                        continue;
                    }
                },
                None => href.to_string(),
            };

            candidates.push(RawCandidate {
                url,
                headline,
                summary: String::new(),
                published_raw: None,
                source_label: None,
            });
        }

        candidates
    }
}

#[async_trait]
impl SourceAdapter for HtmlPageSource {
    fn key(&self) -> &str {
        &self.key
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        let content = self.fetcher.fetch_text(&self.url).await?;
        let candidates = self.parse_content(&content);
        info!("{}: {} article links", self.key, candidates.len());
        Ok(candidates)
    }
}
