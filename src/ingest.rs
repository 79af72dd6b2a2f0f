use crate::fingerprint::fingerprint;
use crate::sources::{SourceAdapter, SourceRegistry};
use crate::store::{EntryStore, NewEntry};
use crate::types::{IngestError, IngestReport, RawCandidate, RelayError, Result, SourceReport};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Storage format for the published column: UTC, seconds precision, no
/// offset suffix. Uniform precision keeps lexical order chronological.
const PUBLISHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone)]
pub struct IngestConfig {
    /// Budget for one adapter fetch; a hung network call must not stall
    /// the rest of the run.
    pub fetch_timeout: Duration,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(10),
        }
    }
}

/// Runs every registered adapter, normalizes and fingerprints candidates,
/// and performs idempotent inserts. One failing source never aborts the
/// others; one malformed candidate never aborts its source.
pub struct IngestOrchestrator {
    registry: SourceRegistry,
    store: Arc<EntryStore>,
    config: IngestConfig,
}

impl IngestOrchestrator {
    pub fn new(registry: SourceRegistry, store: Arc<EntryStore>, config: IngestConfig) -> Self {
        Self {
            registry,
            store,
            config,
        }
    }

    /// Ingest from all registered sources. Infallible by design: failures
    /// land on the per-source reports and in the logs.
    pub async fn ingest_all(&self) -> IngestReport {
        info!("Starting ingestion across {} sources", self.registry.len());

        let mut report = IngestReport::default();
        for (key, adapter) in self.registry.iter() {
            report.push(self.ingest_source(key, adapter).await);
        }

        info!(
            "Ingestion completed: {} new entries from {} sources",
            report.total_new,
            report.sources.len()
        );
        report
    }

    /// Ingest from a single named source. Errors only when the key is not
    /// registered; adapter failures still come back as a report.
    pub async fn ingest_one(&self, key: &str) -> Result<SourceReport> {
        let adapter = self
            .registry
            .get(key)
            .ok_or_else(|| RelayError::UnknownSource {
                key: key.to_string(),
            })?;
        Ok(self.ingest_source(key, adapter).await)
    }

    async fn ingest_source(&self, key: &str, adapter: &dyn SourceAdapter) -> SourceReport {
        let candidates = match tokio::time::timeout(self.config.fetch_timeout, adapter.fetch()).await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(e)) => {
                error!("Error processing source {}: {}", key, e);
                return SourceReport {
                    source: key.to_string(),
                    candidates: 0,
                    new_entries: 0,
                    error: Some(e.to_string()),
                };
            }
            Err(_) => {
                error!("Source {} timed out after {:?}", key, self.config.fetch_timeout);
                return SourceReport {
                    source: key.to_string(),
                    candidates: 0,
                    new_entries: 0,
                    error: Some("fetch timed out".to_string()),
                };
            }
        };

        let total = candidates.len();
        let mut new_entries = 0;
        for candidate in candidates {
            match prepare_candidate(key, &candidate, Utc::now()) {
                Ok(entry) => match self.store.insert_if_absent(&entry).await {
                    Ok(true) => new_entries += 1,
                    Ok(false) => {}
                    Err(e) => warn!("Error storing entry from {}: {}", key, e),
                },
                Err(e) => warn!("Error processing candidate from {}: {}", key, e),
            }
        }

        info!("{}: {} candidates, {} new", key, total, new_entries);
        SourceReport {
            source: key.to_string(),
            candidates: total,
            new_entries,
            error: None,
        }
    }
}

/// Turn a raw candidate into a storable entry: validate, normalize the
/// published timestamp, compute the fingerprint. The normalized timestamp
/// feeds the hash, so this happens exactly once per candidate.
pub fn prepare_candidate(
    source_key: &str,
    candidate: &RawCandidate,
    now: DateTime<Utc>,
) -> std::result::Result<NewEntry, IngestError> {
    if candidate.url.trim().is_empty() {
        return Err(IngestError::MissingUrl);
    }
    let headline = candidate.headline.trim();
    if headline.is_empty() {
        return Err(IngestError::MissingHeadline);
    }

    let published = normalize_published(candidate.published_raw.as_deref(), now);
    let fingerprint = fingerprint(&candidate.url, headline, &published);
    let source = candidate
        .source_label
        .clone()
        .unwrap_or_else(|| source_key.to_string());

    Ok(NewEntry {
        fingerprint,
        source,
        url: candidate.url.clone(),
        headline: headline.to_string(),
        summary: candidate.summary.clone(),
        published,
    })
}

/// Normalize a source-provided timestamp to the storage format. Anything
/// unparseable (or absent) becomes the ingestion wall-clock time.
pub fn normalize_published(raw: Option<&str>, now: DateTime<Utc>) -> String {
    let parsed = raw.and_then(parse_datetime).unwrap_or(now);
    parsed.format(PUBLISHED_FORMAT).to_string()
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }

    None
}
