use async_trait::async_trait;
use news_relay::{
    EntryStore, IngestConfig, IngestOrchestrator, RawCandidate, RelayError, Result,
    SourceAdapter, SourceRegistry,
};
use std::sync::Arc;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .try_init();
}

/// Adapter yielding a fixed candidate list on every fetch.
struct StaticSource {
    key: String,
    candidates: Vec<RawCandidate>,
}

impl StaticSource {
    fn new(key: &str, candidates: Vec<RawCandidate>) -> Self {
        Self {
            key: key.to_string(),
            candidates,
        }
    }
}

#[async_trait]
impl SourceAdapter for StaticSource {
    fn key(&self) -> &str {
        &self.key
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        Ok(self.candidates.clone())
    }
}

/// Adapter that fails on every fetch.
struct FailingSource {
    key: String,
}

#[async_trait]
impl SourceAdapter for FailingSource {
    fn key(&self) -> &str {
        &self.key
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        Err(RelayError::General("connection refused".to_string()))
    }
}

/// Adapter whose fetch never completes within any reasonable budget.
struct HangingSource {
    key: String,
}

#[async_trait]
impl SourceAdapter for HangingSource {
    fn key(&self) -> &str {
        &self.key
    }

    async fn fetch(&self) -> Result<Vec<RawCandidate>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(vec![])
    }
}

fn candidate(url: &str, headline: &str) -> RawCandidate {
    RawCandidate {
        url: url.to_string(),
        headline: headline.to_string(),
        summary: String::new(),
        published_raw: Some("2025-09-06T00:00:00".to_string()),
        source_label: None,
    }
}

fn candidates(key: &str, count: usize) -> Vec<RawCandidate> {
    (0..count)
        .map(|i| candidate(&format!("https://{key}.example.com/{i}"), &format!("{key} story {i}")))
        .collect()
}

fn orchestrator_with(
    store: Arc<EntryStore>,
    adapters: Vec<Box<dyn SourceAdapter>>,
) -> IngestOrchestrator {
    let mut registry = SourceRegistry::new();
    for adapter in adapters {
        registry.register(adapter);
    }
    IngestOrchestrator::new(registry, store, IngestConfig::default())
}

#[tokio::test]
async fn ingestion_is_idempotent() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let orchestrator = orchestrator_with(
        store.clone(),
        vec![
            Box::new(StaticSource::new("alpha", candidates("alpha", 3))),
            Box::new(StaticSource::new("beta", candidates("beta", 2))),
        ],
    );

    let first = orchestrator.ingest_all().await;
    assert_eq!(first.total_new, 5);

    let second = orchestrator.ingest_all().await;
    assert_eq!(second.total_new, 0);
    // Both runs saw the same candidates; only the first inserted.
    assert_eq!(second.sources.iter().map(|s| s.candidates).sum::<usize>(), 5);

    let stored = store.fetch_unposted(None).await.unwrap();
    assert_eq!(stored.len(), 5);
}

#[tokio::test]
async fn one_failing_source_does_not_abort_the_others() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let orchestrator = orchestrator_with(
        store.clone(),
        vec![
            Box::new(StaticSource::new("alpha", candidates("alpha", 2))),
            Box::new(FailingSource {
                key: "broken".to_string(),
            }),
            Box::new(StaticSource::new("beta", candidates("beta", 3))),
            Box::new(StaticSource::new("gamma", candidates("gamma", 1))),
        ],
    );

    let report = orchestrator.ingest_all().await;
    assert_eq!(report.total_new, 6);
    assert_eq!(report.sources.len(), 4);

    let broken = report.sources.iter().find(|s| s.source == "broken").unwrap();
    assert_eq!(broken.new_entries, 0);
    assert!(broken.error.as_deref().unwrap().contains("connection refused"));
}

#[tokio::test(start_paused = true)]
async fn a_hanging_source_times_out_without_stalling_the_others() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let orchestrator = orchestrator_with(
        store.clone(),
        vec![
            Box::new(StaticSource::new("alpha", candidates("alpha", 2))),
            Box::new(HangingSource {
                key: "hung".to_string(),
            }),
            Box::new(StaticSource::new("beta", candidates("beta", 1))),
        ],
    );

    let report = orchestrator.ingest_all().await;
    assert_eq!(report.total_new, 3);

    let hung = report.sources.iter().find(|s| s.source == "hung").unwrap();
    assert_eq!(hung.candidates, 0);
    assert_eq!(hung.new_entries, 0);
    assert_eq!(hung.error.as_deref(), Some("fetch timed out"));

    let stored = store.fetch_unposted(None).await.unwrap();
    assert_eq!(stored.len(), 3);
}

#[tokio::test]
async fn malformed_candidates_are_skipped_not_fatal() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let mixed = vec![
        candidate("https://alpha.example.com/ok", "A perfectly fine story"),
        RawCandidate {
            url: String::new(),
            headline: "No url on this one".to_string(),
            ..Default::default()
        },
        RawCandidate {
            url: "https://alpha.example.com/untitled".to_string(),
            ..Default::default()
        },
        candidate("https://alpha.example.com/ok2", "Another fine story"),
    ];
    let orchestrator =
        orchestrator_with(store.clone(), vec![Box::new(StaticSource::new("alpha", mixed))]);

    let report = orchestrator.ingest_all().await;
    assert_eq!(report.total_new, 2);
    assert_eq!(report.sources[0].candidates, 4);
    assert!(report.sources[0].error.is_none());
}

#[tokio::test]
async fn ingest_one_targets_a_single_source() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let orchestrator = orchestrator_with(
        store.clone(),
        vec![
            Box::new(StaticSource::new("alpha", candidates("alpha", 2))),
            Box::new(StaticSource::new("beta", candidates("beta", 2))),
        ],
    );

    let report = orchestrator.ingest_one("alpha").await.unwrap();
    assert_eq!(report.source, "alpha");
    assert_eq!(report.new_entries, 2);

    let stored = store.fetch_unposted(None).await.unwrap();
    assert!(stored.iter().all(|e| e.source == "alpha"));
}

#[tokio::test]
async fn ingest_one_rejects_unknown_keys() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let orchestrator = orchestrator_with(
        store.clone(),
        vec![Box::new(StaticSource::new("alpha", candidates("alpha", 1)))],
    );

    let err = orchestrator.ingest_one("nope").await.unwrap_err();
    assert!(matches!(err, RelayError::UnknownSource { ref key } if key == "nope"));
}

#[tokio::test]
async fn identical_content_from_two_sources_merges() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let shared = candidate("https://syndicated.example.com/story", "Shared wire story");
    let orchestrator = orchestrator_with(
        store.clone(),
        vec![
            Box::new(StaticSource::new("alpha", vec![shared.clone()])),
            Box::new(StaticSource::new("beta", vec![shared])),
        ],
    );

    // The fingerprint ignores the source key, so the second insert is a no-op.
    let report = orchestrator.ingest_all().await;
    assert_eq!(report.total_new, 1);

    let stored = store.fetch_unposted(None).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].source, "alpha");
}

#[tokio::test]
async fn source_label_overrides_the_adapter_key() {
    init_tracing();
    let store = Arc::new(EntryStore::open_in_memory().await.unwrap());
    let tagged = RawCandidate {
        source_label: Some("newsapi_Herald".to_string()),
        ..candidate("https://herald.example.com/storm", "Storm damage reported")
    };
    let orchestrator =
        orchestrator_with(store.clone(), vec![Box::new(StaticSource::new("newsapi", vec![tagged]))]);

    assert_eq!(orchestrator.ingest_all().await.total_new, 1);
    let stored = store.fetch_unposted(None).await.unwrap();
    assert_eq!(stored[0].source, "newsapi_Herald");
}
