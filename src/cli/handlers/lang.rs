use anyhow::Result;
use tracing::debug;

use crate::args::LangAction;
use crate::cli::{client_resolver, config_client, http_client, preference_store};
use crate::clients::ConfigSource;
use crate::config::AppConfig;
use crate::preferences::{FilePreferenceStorage, PreferenceStorage, PreferenceStore, StoreState};
use crate::types::{ConfigPayload, Language};

/// Handler for the lang command
pub async fn handle_lang(config: &AppConfig, action: LangAction) -> Result<()> {
    match action {
        LangAction::Show => {
            let path = config.preferences_path()?;
            let storage = FilePreferenceStorage::new(&path);
            match storage.load() {
                Ok(Some(language)) => println!("✅ Stored preference: {language}"),
                Ok(None) => println!("ℹ️  No stored preference, default is {}", Language::En),
                Err(e) => println!("⚠️  Could not read {}: {e}", path.display()),
            }
        }
        LangAction::Init => {
            let client = http_client()?;
            let store = preference_store(config, &client)?;
            let start = store.initialize();
            start.fetch.await?;

            if start.restored.is_none() {
                // No stored choice: suggest one from geolocation, without persisting it.
                let resolver = client_resolver(config, &client);
                let suggested = resolver.detect().await;
                println!(
                    "🌍 No stored preference; geolocation suggests {} (country {})",
                    suggested.language,
                    if suggested.signal.country_code.is_empty() {
                        "unknown"
                    } else {
                        suggested.signal.country_code.as_str()
                    }
                );
            }
            print_state(&store);
        }
        LangAction::Set { language } => {
            let client = http_client()?;
            let store = preference_store(config, &client)?;
            let fetch = store.switch_language(language);
            fetch.await?;
            println!("✅ Language set to {language}");
            print_state(&store);
        }
    }
    Ok(())
}

/// Handler for the fetch-config command
pub async fn handle_fetch_config(config: &AppConfig, language: Language) -> Result<()> {
    let client = http_client()?;
    let source = config_client(config, &client);
    debug!(url = %source.config_url(), "fetching configuration");
    let payload = source.fetch(language).await?;
    print_payload(language, &payload);
    Ok(())
}

fn print_state(store: &PreferenceStore) {
    match store.snapshot() {
        StoreState::Uninitialized => println!("⚠️  Store not initialized"),
        StoreState::Ready(state) => match &state.config {
            Some(payload) => print_payload(state.active_language, payload),
            None => {
                println!("📦 Active language: {}", state.active_language);
                match store.last_fetch_error() {
                    Some(err) => println!("⚠️  Configuration not loaded: {err}"),
                    None => println!("⚠️  Configuration not loaded"),
                }
            }
        },
    }
}

fn print_payload(language: Language, payload: &ConfigPayload) {
    println!("📦 Active language: {language}");
    println!("   Translations: {} keys", payload.translations.len());
    println!("   Cargo types:");
    for cargo in &payload.cargo_types {
        println!("     - {} ({})", cargo.name, cargo.id);
    }
}
