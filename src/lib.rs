pub mod args;
pub mod cli;
pub mod clients;
pub mod config;
pub mod domain_policy;
pub mod errors;
pub mod geo;
pub mod logging;
pub mod preferences;
pub mod server;
pub mod types;

// Re-export commonly used items for convenience
pub use config::AppConfig;
pub use errors::AppError;
pub use types::{GeoSignal, Language, LanguageDecision, SignalSource};
