use crate::config::{LabelIds, PublishConfig};
use crate::platform::PublishPlatform;
use crate::store::EntryStore;
use crate::types::{Entry, Result};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use url::Url;

/// Denylist of sources and link domains excluded from publishing.
#[derive(Debug, Clone, Default)]
pub struct BlockList {
    sources: HashSet<String>,
    domains: Vec<String>,
}

impl BlockList {
    pub fn new(sources: &[String], domains: &[String]) -> Self {
        Self {
            sources: sources.iter().map(|s| s.trim().to_lowercase()).collect(),
            domains: domains.iter().map(|d| d.trim().to_lowercase()).collect(),
        }
    }

    /// Exact, case-insensitive match on the source key.
    pub fn blocks_source(&self, source: &str) -> bool {
        self.sources.contains(&source.to_lowercase())
    }

    /// Match when the URL's host equals a blocked domain or is a subdomain
    /// of one. Unparseable URLs are not blocked.
    pub fn blocks_url(&self, url: &str) -> bool {
        let host = match Url::parse(url).ok().and_then(|u| u.host_str().map(str::to_lowercase)) {
            Some(host) => host,
            None => return false,
        };
        self.domains
            .iter()
            .any(|d| host == *d || host.ends_with(&format!(".{d}")))
    }

    fn blocks(&self, entry: &Entry) -> bool {
        if self.blocks_source(&entry.source) {
            debug!("Skipping blocked source: {}", entry.source);
            return true;
        }
        if self.blocks_url(&entry.url) {
            debug!("Skipping blocked domain: {}", entry.url);
            return true;
        }
        false
    }
}

/// Chooses entries eligible for outbound posting: unposted, not blocked,
/// newest first.
pub struct PublishSelector {
    store: Arc<EntryStore>,
    block_list: BlockList,
}

impl PublishSelector {
    pub fn new(store: Arc<EntryStore>, block_list: BlockList) -> Self {
        Self { store, block_list }
    }

    /// Ordering comes from the store (published descending, id descending).
    /// The block lists are applied before the limit, so blocked entries
    /// never use up the batch size.
    pub async fn select_candidates(
        &self,
        limit: Option<usize>,
        source: Option<&str>,
    ) -> Result<Vec<Entry>> {
        let mut entries = self.store.fetch_unposted(source).await?;
        entries.retain(|entry| !self.block_list.blocks(entry));
        if let Some(limit) = limit {
            entries.truncate(limit);
        }
        Ok(entries)
    }
}

/// Category assigned by the headline keyword classifier, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelCategory {
    Violence,
    Fire,
    Homelessness,
}

impl LabelCategory {
    pub fn label_id<'a>(&self, labels: &'a LabelIds) -> Option<&'a str> {
        match self {
            LabelCategory::Violence => labels.violence.as_deref(),
            LabelCategory::Fire => labels.fire.as_deref(),
            LabelCategory::Homelessness => labels.homelessness.as_deref(),
        }
    }
}

const VIOLENCE_KEYWORDS: &[&str] = &[
    "shot", "shots", "shooter", "shooters", "shooting", "gunshot", "gunshots",
];
const FIRE_KEYWORDS: &[&str] = &["fire"];
const HOMELESSNESS_KEYWORDS: &[&str] = &["homeless", "homelessness", "unhoused"];

/// Small keyword classifier over the headline; first matching category in
/// priority order wins, no match means no label.
pub fn classify_headline(headline: &str) -> Option<LabelCategory> {
    let lower = headline.to_lowercase();
    if VIOLENCE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(LabelCategory::Violence);
    }
    if FIRE_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(LabelCategory::Fire);
    }
    if HOMELESSNESS_KEYWORDS.iter().any(|k| lower.contains(k)) {
        return Some(LabelCategory::Homelessness);
    }
    None
}

/// Transliterate typographic punctuation to ASCII and drop whatever
/// non-ASCII remains.
pub fn sanitize_title(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\u{2018}' | '\u{2019}' => out.push('\''),
            '\u{201C}' | '\u{201D}' => out.push('"'),
            '\u{2013}' | '\u{2014}' => out.push('-'),
            '\u{2026}' => out.push_str("..."),
            '\u{00A0}' => out.push(' '),
            c if c.is_ascii() => out.push(c),
            _ => {}
        }
    }
    out
}

/// Platform title: bracketed uppercased source key, sanitized, truncated to
/// the maximum length with a trailing ellipsis marker when cut.
pub fn compose_title(source: &str, headline: &str, max_len: usize) -> String {
    let title = sanitize_title(&format!("[{}] {}", source.to_uppercase(), headline));
    // All-ASCII after sanitizing, so byte indexing is safe.
    if title.len() > max_len {
        format!("{}...", &title[..max_len.saturating_sub(3)])
    } else {
        title
    }
}

/// Submits selected entries to the external platform one at a time,
/// sequential by design: the inter-post delay is the rate-limit contract.
pub struct PublishDriver<P: PublishPlatform> {
    platform: P,
    store: Arc<EntryStore>,
    config: PublishConfig,
}

impl<P: PublishPlatform> PublishDriver<P> {
    pub fn new(platform: P, store: Arc<EntryStore>, config: PublishConfig) -> Self {
        Self {
            platform,
            store,
            config,
        }
    }

    /// Submit each entry in order and return the number of successes.
    /// Individual failures are logged and skipped; they neither abort the
    /// batch nor consume the inter-post delay. The posted flag is flipped
    /// only after a confirmed successful submission (at-least-once).
    pub async fn publish(&self, entries: &[Entry]) -> usize {
        if entries.is_empty() {
            info!("No unposted entries to publish");
            return 0;
        }

        info!("Publishing {} entries", entries.len());
        let mut posted = 0;

        for entry in entries {
            let title = compose_title(&entry.source, &entry.headline, self.config.max_title_len);

            match self.platform.submit(&title, &entry.url).await {
                Ok(handle) => {
                    if let Some(category) = classify_headline(&entry.headline) {
                        if let Some(label_id) = category.label_id(&self.config.labels) {
                            if let Err(e) = self.platform.apply_label(&handle, label_id).await {
                                // Post already succeeded; the label is best-effort.
                                warn!("Failed to apply label to {}: {}", handle.id, e);
                            }
                        }
                    }

                    if let Err(e) = self.store.mark_posted(entry.id).await {
                        error!("Submitted entry {} but could not mark it posted: {}", entry.id, e);
                    }

                    posted += 1;
                    info!("Posted: {}", title);
                    tokio::time::sleep(self.config.post_delay).await;
                }
                Err(e) => {
                    error!("Failed to post {}: {}", entry.url, e);
                }
            }
        }

        info!("Posted {}/{} entries", posted, entries.len());
        posted
    }
}
