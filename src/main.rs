use anyhow::Context;
use clap::Parser;
use news_relay::{
    BlockList, EntryStore, Fetcher, IngestConfig, IngestOrchestrator, PublishDriver,
    PublishSelector, RelayConfig, RestPlatform, SourceRegistry,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "news-relay", about = "News scraper and outbound platform poster")]
struct Cli {
    /// Ingest news from the registered sources
    #[arg(long)]
    scrape: bool,

    /// Post unposted entries to the platform
    #[arg(long)]
    post: bool,

    /// Scrape and post (default when neither flag is given)
    #[arg(long)]
    all: bool,

    /// Maximum number of posts per run (defaults to the configured limit)
    #[arg(long)]
    limit: Option<usize>,

    /// Only operate on a specific source key
    #[arg(long)]
    source: Option<String>,

    /// Path to the JSON configuration file
    #[arg(long, default_value = "relay.json")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let run_all = cli.all || (!cli.scrape && !cli.post);
    let scrape = cli.scrape || run_all;
    let post = cli.post || run_all;

    let config = RelayConfig::load(&cli.config)
        .with_context(|| format!("failed to load config from {}", cli.config.display()))?;

    let store = Arc::new(
        EntryStore::open(Path::new(&config.database_path))
            .await
            .with_context(|| format!("failed to open store at {}", config.database_path))?,
    );

    if scrape {
        let fetcher = Arc::new(Fetcher::new(config.fetch.clone())?);
        let registry = SourceRegistry::from_specs(&config.sources, fetcher)?;
        let orchestrator = IngestOrchestrator::new(
            registry,
            store.clone(),
            IngestConfig {
                fetch_timeout: Duration::from_secs(config.fetch_timeout_secs),
            },
        );

        let total_new = match &cli.source {
            Some(key) => {
                let report = orchestrator.ingest_one(key).await?;
                report.new_entries
            }
            None => orchestrator.ingest_all().await.total_new,
        };
        info!("Ingestion added {} new entries", total_new);
    }

    if post {
        // Credentials are validated here, before any work starts.
        let platform = RestPlatform::new(&config.platform)?;
        let selector = PublishSelector::new(
            store.clone(),
            BlockList::new(&config.blocked_sources, &config.blocked_domains),
        );

        let limit = cli.limit.unwrap_or(config.publish_limit);
        let candidates = selector
            .select_candidates(Some(limit), cli.source.as_deref())
            .await?;

        let driver = PublishDriver::new(platform, store.clone(), config.publish_config());
        let posted = driver.publish(&candidates).await;
        info!("Posted {} entries to the platform", posted);
    }

    let stats = store.stats().await?;
    info!(
        "Store: {} entries, {} unposted, {} sources",
        stats.get("total_entries").copied().unwrap_or(0),
        stats.get("unposted_entries").copied().unwrap_or(0),
        stats.get("distinct_sources").copied().unwrap_or(0),
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn an_explicit_zero_limit_is_kept_distinct_from_the_default() {
        let cli = Cli::try_parse_from(["news-relay", "--post", "--limit", "0"]).unwrap();
        assert_eq!(cli.limit, Some(0));

        let cli = Cli::try_parse_from(["news-relay", "--post"]).unwrap();
        assert_eq!(cli.limit, None);
    }
}
