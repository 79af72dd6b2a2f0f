use serde::{Deserialize, Serialize};

/// One normalized piece of ingested content, as persisted in the entry store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    /// Store-assigned surrogate, monotonically increasing.
    pub id: i64,
    /// Stable content identity, unique across the store.
    pub fingerprint: String,
    /// Key of the originating adapter (e.g. "rss:wuky", "lexington_gov").
    pub source: String,
    pub url: String,
    pub headline: String,
    pub summary: String,
    /// ISO-8601 text; all values written by this crate are normalized to
    /// UTC seconds precision so lexical order equals chronological order.
    pub published: String,
    /// Only field mutable after creation; transitions false -> true once.
    pub posted: bool,
}

/// Raw candidate entry yielded by a source adapter, before normalization.
#[derive(Debug, Clone, Default)]
pub struct RawCandidate {
    pub url: String,
    pub headline: String,
    pub summary: String,
    /// May be absent, a non-ISO string, or valid ISO; the orchestrator
    /// normalizes it before hashing.
    pub published_raw: Option<String>,
    /// Per-candidate source key override (e.g. "newsapi_<outlet>").
    pub source_label: Option<String>,
}

/// Outcome of ingesting a single source.
#[derive(Debug, Clone)]
pub struct SourceReport {
    pub source: String,
    /// Candidates the adapter yielded (0 when the fetch itself failed).
    pub candidates: usize,
    /// Entries whose fingerprint was new to the store.
    pub new_entries: usize,
    /// Adapter-level failure, if any. Candidate-level failures are only
    /// logged; they never abort the rest of the source.
    pub error: Option<String>,
}

/// Aggregated outcome of an ingestion run across all sources.
#[derive(Debug, Clone, Default)]
pub struct IngestReport {
    pub total_new: usize,
    pub sources: Vec<SourceReport>,
}

impl IngestReport {
    pub fn push(&mut self, report: SourceReport) {
        self.total_new += report.new_entries;
        self.sources.push(report);
    }
}

/// Why a single candidate was rejected during ingestion. Typed so tests can
/// inspect failure reasons; the orchestrator logs these and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestError {
    #[error("candidate has no url")]
    MissingUrl,

    #[error("candidate has no headline")]
    MissingHeadline,
}

#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unknown source: {key}")]
    UnknownSource { key: String },

    #[error("Platform credentials unavailable: {0}")]
    Credentials(String),

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
