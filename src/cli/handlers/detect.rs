use anyhow::Result;

use crate::cli::{client_resolver, http_client};
use crate::config::AppConfig;

/// Handler for the detect command
pub async fn handle_detect(config: &AppConfig) -> Result<()> {
    let client = http_client()?;
    let resolver = client_resolver(config, &client);
    println!("🌍 Trying providers: {}", resolver.provider_names().join(", "));

    let (decision, provider) = resolver.detect_with_provider().await;
    match provider {
        Some(name) => println!(
            "✅ {} detected {} -> {}",
            name, decision.signal.country_code, decision.language
        ),
        None => println!("⚠️  All geolocation providers failed, using {}", decision.language),
    }
    println!("{}", serde_json::to_string_pretty(&decision)?);
    Ok(())
}
