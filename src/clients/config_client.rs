use crate::errors::ConfigFetchError;
use crate::types::{ConfigEnvelope, ConfigPayload, Language};
use async_trait::async_trait;
use reqwest::{header, Client};
use std::time::Duration;
use tracing::debug;

const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Anything that can produce the translation/cargo-type payload for a language.
#[async_trait]
pub trait ConfigSource: Send + Sync {
    async fn fetch(&self, language: Language) -> Result<ConfigPayload, ConfigFetchError>;
}

/// Client for the remote configuration API. One request per call, no retries.
#[derive(Debug, Clone)]
pub struct ConfigClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl ConfigClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, Client::new())
    }

    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        ConfigClient {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn config_url(&self) -> String {
        format!("{}/config", self.base_url)
    }
}

#[async_trait]
impl ConfigSource for ConfigClient {
    async fn fetch(&self, language: Language) -> Result<ConfigPayload, ConfigFetchError> {
        let url = self.config_url();
        debug!(%url, %language, "fetching remote configuration");

        let response = self
            .client
            .get(&url)
            .query(&[("type", "all"), ("lang", language.code())])
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ConfigFetchError::Status {
                status_code: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let envelope: ConfigEnvelope =
            serde_json::from_slice(&body).map_err(|e| ConfigFetchError::Parse(e.to_string()))?;

        if !envelope.success {
            return Err(ConfigFetchError::Api(
                envelope
                    .error
                    .unwrap_or_else(|| "No message provided".to_string()),
            ));
        }

        Ok(ConfigPayload::from_parts(
            envelope.translations.as_ref(),
            envelope.cargo_types.unwrap_or_default(),
        ))
    }
}
