//! Third-party IP geolocation providers used on the client side.

use crate::config::GeoProviderConfig;
use crate::errors::ProviderError;
use crate::geo::classifier::{is_country_code, normalize_country};
use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;

pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
const DEFAULT_TIMEOUT_SECONDS: u64 = 5;

/// One source of a country code. Implementations never retry.
#[async_trait]
pub trait GeoProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Uppercase two-letter country code, or why none could be produced.
    async fn attempt(&self) -> Result<String, ProviderError>;
}

/// GET a JSON document and read the country code from one field.
///
/// `country_field` is a dotted path into the document (`country_code`, `location.country`).
#[derive(Debug, Clone)]
pub struct HttpJsonProvider {
    name: String,
    url: String,
    country_field: String,
    client: Client,
    max_body_bytes: usize,
    timeout: Duration,
}

impl HttpJsonProvider {
    pub fn new(
        name: impl Into<String>,
        url: impl Into<String>,
        country_field: impl Into<String>,
        client: Client,
    ) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            country_field: country_field.into(),
            client,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
        }
    }

    pub fn from_config(config: &GeoProviderConfig, client: Client) -> Self {
        Self::new(&config.name, &config.url, &config.country_field, client)
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn parse_failure(&self, reason: impl Into<String>) -> ProviderError {
        ProviderError::ParseFailure {
            provider: self.name.clone(),
            reason: reason.into(),
        }
    }

    fn unreachable(&self, source: reqwest::Error) -> ProviderError {
        ProviderError::Unreachable {
            provider: self.name.clone(),
            source,
        }
    }

    async fn read_bounded(&self, mut response: reqwest::Response) -> Result<Vec<u8>, ProviderError> {
        if let Some(len) = response.content_length() {
            if len as usize > self.max_body_bytes {
                return Err(self.parse_failure(format!("body of {len} bytes exceeds limit")));
            }
        }
        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.unreachable(e))? {
            if body.len() + chunk.len() > self.max_body_bytes {
                return Err(self.parse_failure("body exceeds limit"));
            }
            body.extend_from_slice(&chunk);
        }
        Ok(body)
    }

    /// Apply this provider's extraction rule to a parsed document.
    pub fn extract_country(&self, document: &Value) -> Result<String, ProviderError> {
        let pointer = format!("/{}", self.country_field.replace('.', "/"));
        let raw = match document.pointer(&pointer) {
            Some(Value::String(s)) => s.as_str(),
            Some(Value::Null) | None => "",
            Some(other) => {
                return Err(self.parse_failure(format!(
                    "field '{}' is not a string: {other}",
                    self.country_field
                )))
            }
        };
        let code = normalize_country(raw);
        if code.is_empty() {
            return Err(ProviderError::MissingCountry {
                provider: self.name.clone(),
            });
        }
        if !is_country_code(&code) {
            return Err(self.parse_failure(format!("'{raw}' is not a country code")));
        }
        Ok(code)
    }
}

#[async_trait]
impl GeoProvider for HttpJsonProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn attempt(&self) -> Result<String, ProviderError> {
        let response = self
            .client
            .get(&self.url)
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| self.unreachable(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ProviderError::Status {
                provider: self.name.clone(),
                status: status.as_u16(),
            });
        }

        let body = self.read_bounded(response).await?;
        let document: Value =
            serde_json::from_slice(&body).map_err(|e| self.parse_failure(e.to_string()))?;
        self.extract_country(&document)
    }
}

/// Build the configured provider chain, in order.
pub fn build_providers(
    configs: &[GeoProviderConfig],
    client: &Client,
    max_body_bytes: usize,
    timeout: Duration,
) -> Vec<Box<dyn GeoProvider>> {
    configs
        .iter()
        .map(|cfg| {
            Box::new(
                HttpJsonProvider::from_config(cfg, client.clone())
                    .with_max_body_bytes(max_body_bytes)
                    .with_timeout(timeout),
            ) as Box<dyn GeoProvider>
        })
        .collect()
}
