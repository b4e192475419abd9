pub mod config_client;

pub use config_client::{ConfigClient, ConfigSource};
