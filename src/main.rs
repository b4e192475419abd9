use anyhow::Result;
use tracing::Level;

use geolang::args::Args;
use geolang::cli;
use geolang::config::ConfigLoader;
use geolang::logging::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse_args();

    let loader = match &args.config {
        Some(path) => ConfigLoader::with_file(path.clone()),
        None => ConfigLoader::new(),
    };
    let config = loader.load_config()?;

    let logging = if args.verbose {
        config.logging.clone().with_level(Level::DEBUG)
    } else {
        config.logging.clone()
    };
    init_logging(&logging);

    cli::run(args, config).await
}
