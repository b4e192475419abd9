pub mod app_config;
pub mod loader;

// Re-export commonly used types
pub use app_config::{
    default_providers, ApiConfig, AppConfig, GeoProviderConfig, GeolocationConfig,
    PreferencesConfig, ServerConfig,
};
pub use loader::ConfigLoader;

// Re-export constants
pub use app_config::{CONFIG_FILE_NAME, DEFAULT_API_BASE_URL, DEFAULT_BIND, USER_CONFIG_PATH};
