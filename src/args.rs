use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::Language;

/// geolang - display language resolution from geolocation
#[derive(Parser, Debug)]
#[command(name = "geolang", version)]
#[command(about = "Resolve the display language (en/zh) from geolocation signals")]
pub struct Args {
    /// Subcommand
    #[command(subcommand)]
    pub command: Command,

    /// Config file path (default ~/.config/geolang/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the HTTP server (page context, /debug, /health)
    Serve {
        /// Listen address, overrides the configured one
        #[arg(long)]
        bind: Option<String>,
    },
    /// Detect the language through the client-side geolocation providers
    Detect,
    /// Fetch the remote configuration once and summarise it
    FetchConfig {
        #[arg(long, default_value = "en")]
        lang: Language,
    },
    /// Stored language preference
    Lang {
        #[command(subcommand)]
        action: LangAction,
    },
    /// Run the server-side resolver against a synthetic request
    Resolve {
        /// Request host, e.g. localhost:5176 or www.dock2gdansk.com
        #[arg(long)]
        host: String,
        /// Request header as NAME=VALUE, repeatable
        #[arg(long = "header", value_name = "NAME=VALUE")]
        headers: Vec<String>,
        /// Query string without the leading '?', e.g. test-country=CN
        #[arg(long)]
        query: Option<String>,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
pub enum LangAction {
    /// Print the stored preference (or the default)
    Show,
    /// Start a session: load the preference, fetch its configuration
    Init,
    /// Switch language, persist it and load its configuration
    Set { language: Language },
}

impl Args {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}
