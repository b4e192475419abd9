//! Client-side country detection over an ordered provider chain.

use crate::geo::classifier::{decide, RegionSet};
use crate::geo::providers::GeoProvider;
use crate::types::{GeoSignal, LanguageDecision, SignalSource};
use tracing::{debug, info, warn};

/// First provider answer that produced a country code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderHit {
    pub provider: String,
    pub country_code: String,
}

/// Runs providers one after another and stops at the first country code.
///
/// Providers are awaited strictly in sequence. A failing provider is logged and skipped;
/// nothing here returns an error.
pub struct ClientGeoResolver {
    providers: Vec<Box<dyn GeoProvider>>,
}

impl ClientGeoResolver {
    pub fn new(providers: Vec<Box<dyn GeoProvider>>) -> Self {
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    pub async fn resolve_country(&self) -> Option<ProviderHit> {
        for provider in &self.providers {
            debug!(provider = provider.name(), "trying geolocation provider");
            match provider.attempt().await {
                Ok(country_code) => {
                    info!(provider = provider.name(), %country_code, "provider detected country");
                    return Some(ProviderHit {
                        provider: provider.name().to_string(),
                        country_code,
                    });
                }
                Err(e) => {
                    warn!(provider = provider.name(), error = %e, "geolocation provider failed");
                }
            }
        }
        warn!("all geolocation providers failed, using default language");
        None
    }

    /// Detected language using the client region set; English when nothing resolved.
    pub async fn detect(&self) -> LanguageDecision {
        self.detect_with_provider().await.0
    }

    /// Like [`detect`](Self::detect), also naming the provider that answered.
    pub async fn detect_with_provider(&self) -> (LanguageDecision, Option<String>) {
        match self.resolve_country().await {
            Some(hit) => {
                let decision = decide(
                    GeoSignal::new(hit.country_code, SignalSource::ClientApi),
                    RegionSet::Client,
                );
                (decision, Some(hit.provider))
            }
            None => (LanguageDecision::fallback(), None),
        }
    }
}
