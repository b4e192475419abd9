//! Command dispatch for the geolang binary.

pub mod handlers;

use anyhow::Result;
use std::sync::Arc;

use crate::args::{Args, Command};
use crate::clients::ConfigClient;
use crate::config::AppConfig;
use crate::errors::AppError;
use crate::geo::providers::build_providers;
use crate::geo::ClientGeoResolver;
use crate::preferences::{FilePreferenceStorage, PreferenceStore};

pub async fn run(args: Args, mut config: AppConfig) -> Result<()> {
    match args.command {
        Command::Serve { bind } => {
            if let Some(bind) = bind {
                config.server.bind = bind;
            }
            handlers::serve::handle_serve(&config).await
        }
        Command::Detect => handlers::detect::handle_detect(&config).await,
        Command::FetchConfig { lang } => handlers::lang::handle_fetch_config(&config, lang).await,
        Command::Lang { action } => handlers::lang::handle_lang(&config, action).await,
        Command::Resolve {
            host,
            headers,
            query,
        } => handlers::resolve::handle_resolve(&host, &headers, query.as_deref()),
    }
}

pub fn http_client() -> Result<reqwest::Client, AppError> {
    reqwest::Client::builder()
        .user_agent(concat!("geolang/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| AppError::Server(format!("failed to build HTTP client: {e}")))
}

pub fn client_resolver(config: &AppConfig, client: &reqwest::Client) -> ClientGeoResolver {
    ClientGeoResolver::new(build_providers(
        &config.geolocation.providers,
        client,
        config.geolocation.max_body_bytes,
        config.geolocation.timeout,
    ))
}

pub fn config_client(config: &AppConfig, client: &reqwest::Client) -> ConfigClient {
    ConfigClient::with_client(&config.api.base_url, client.clone()).with_timeout(config.api.timeout)
}

pub fn preference_store(config: &AppConfig, client: &reqwest::Client) -> Result<Arc<PreferenceStore>> {
    let storage = FilePreferenceStorage::new(config.preferences_path()?);
    Ok(PreferenceStore::new(
        Arc::new(storage),
        Arc::new(config_client(config, client)),
    ))
}
