use anyhow::Result;
use tracing::info;

use crate::config::AppConfig;
use crate::server::start_server;

/// Handler for the serve command
pub async fn handle_serve(config: &AppConfig) -> Result<()> {
    info!(
        bind = %config.server.bind,
        security_headers = config.server.security_headers,
        "starting server"
    );
    println!("🚀 geolang listening on http://{}", config.server.bind);
    start_server(config).await?;
    Ok(())
}
