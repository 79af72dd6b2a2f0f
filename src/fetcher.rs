use crate::config::FetchConfig;
use crate::types::{RelayError, Result};
use backoff::backoff::Backoff;
use backoff::exponential::ExponentialBackoff;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Shared HTTP helper for source adapters and the platform client. One
/// instance is built per process and handed to every adapter; each request
/// carries the configured timeout so a dead host cannot stall a batch.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .build()?;

        Ok(Self { client, config })
    }

    /// Fetch a URL as text, retrying transient failures with exponential
    /// backoff. Non-2xx statuses count as failures.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch_text_with_query(url, &[]).await
    }

    /// Same as [`fetch_text`](Self::fetch_text) with query parameters
    /// appended (JSON API adapters build their requests this way).
    pub async fn fetch_text_with_query(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 8),
            multiplier: 2.0,
            max_elapsed_time: Some(Duration::from_secs(self.config.retry_delay_seconds * 30)),
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.fetch_once(url, query).await {
                Ok(body) => {
                    debug!("Fetched {} ({} bytes)", url, body.len());
                    return Ok(body);
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}, retrying in {:?}", attempt + 1, url, delay);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| RelayError::General(format!("fetch failed: {url}"))))
    }

    async fn fetch_once(&self, url: &str, query: &[(&str, String)]) -> Result<String> {
        let mut request = self.client.get(url);
        if !query.is_empty() {
            request = request.query(query);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::General(format!(
                "HTTP {}: {} for {}",
                status,
                status.canonical_reason().unwrap_or("Unknown"),
                url
            )));
        }

        Ok(response.text().await?)
    }
}
