use crate::config::PlatformConfig;
use crate::types::{RelayError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

/// Identifier of a submission accepted by the external platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostHandle {
    pub id: String,
}

/// Boundary to the external posting platform. The driver only relies on
/// this contract; the wire format of any particular platform stays behind
/// an implementation of it.
#[async_trait]
pub trait PublishPlatform: Send + Sync {
    /// Submit a link post. Errors are per-submission; callers continue
    /// with the rest of their batch.
    async fn submit(&self, title: &str, url: &str) -> Result<PostHandle>;

    /// Apply a category label to an accepted post. Best-effort: callers
    /// swallow failures.
    async fn apply_label(&self, post: &PostHandle, label_id: &str) -> Result<()>;
}

/// Validated platform credentials. Construction is the fail-fast point:
/// publishing cannot partially run with an incomplete configuration.
#[derive(Debug, Clone)]
pub struct PlatformCredentials {
    pub token: String,
    pub user_agent: String,
}

impl PlatformCredentials {
    pub fn from_config(config: &PlatformConfig) -> Result<Self> {
        let token = config
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| RelayError::Credentials("platform token is not set".to_string()))?;

        if config.endpoint.trim().is_empty() {
            return Err(RelayError::Credentials(
                "platform endpoint is not set".to_string(),
            ));
        }

        // HTTP header values must be ASCII-safe.
        let user_agent: String = config.user_agent.chars().filter(char::is_ascii).collect();
        let user_agent = if user_agent.trim().is_empty() {
            "news-relay/0.1".to_string()
        } else {
            user_agent
        };

        Ok(Self {
            token: token.to_string(),
            user_agent,
        })
    }
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    id: String,
}

/// Generic REST implementation of [`PublishPlatform`]: JSON POSTs with a
/// bearer token. Owned exclusively by the publish driver; built once and
/// reused for the whole batch.
pub struct RestPlatform {
    client: reqwest::Client,
    endpoint: String,
    credentials: PlatformCredentials,
}

impl RestPlatform {
    pub fn new(config: &PlatformConfig) -> Result<Self> {
        let credentials = PlatformCredentials::from_config(config)?;
        let client = reqwest::Client::builder()
            .user_agent(&credentials.user_agent)
            .build()?;

        Ok(Self {
            client,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
            credentials,
        })
    }
}

#[async_trait]
impl PublishPlatform for RestPlatform {
    async fn submit(&self, title: &str, url: &str) -> Result<PostHandle> {
        let response = self
            .client
            .post(format!("{}/posts", self.endpoint))
            .bearer_auth(&self.credentials.token)
            .json(&json!({ "title": title, "url": url }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Platform(format!("submit rejected: HTTP {status}")));
        }

        let body: SubmitResponse = response
            .json()
            .await
            .map_err(|e| RelayError::Platform(format!("bad submit response: {e}")))?;
        debug!("Platform accepted post {}", body.id);
        Ok(PostHandle { id: body.id })
    }

    async fn apply_label(&self, post: &PostHandle, label_id: &str) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/posts/{}/label", self.endpoint, post.id))
            .bearer_auth(&self.credentials.token)
            .json(&json!({ "label_id": label_id }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RelayError::Platform(format!("label rejected: HTTP {status}")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlatformConfig;

    #[test]
    fn missing_token_is_a_credentials_error() {
        let config = PlatformConfig {
            endpoint: "https://platform.example/api".to_string(),
            token: None,
            ..Default::default()
        };
        assert!(matches!(
            PlatformCredentials::from_config(&config),
            Err(RelayError::Credentials(_))
        ));

        let blank = PlatformConfig {
            endpoint: "https://platform.example/api".to_string(),
            token: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            PlatformCredentials::from_config(&blank),
            Err(RelayError::Credentials(_))
        ));
    }

    #[test]
    fn user_agent_is_stripped_to_ascii() {
        let config = PlatformConfig {
            endpoint: "https://platform.example/api".to_string(),
            token: Some("t0ken".to_string()),
            user_agent: "news\u{2013}relay \u{00e9}dition/1.0".to_string(),
            ..Default::default()
        };
        let credentials = PlatformCredentials::from_config(&config).unwrap();
        assert!(credentials.user_agent.is_ascii());
        assert_eq!(credentials.user_agent, "newsrelay dition/1.0");
    }
}
