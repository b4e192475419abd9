use crate::errors::ConfigError;
use crate::logging::{LogFormat, LoggingConfig};
use serde::Deserialize;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use super::loader::ConfigLoader;

// Configuration location constants, relative to the home directory
pub const USER_CONFIG_PATH: &str = ".config/geolang";
pub const CONFIG_FILE_NAME: &str = "config.toml";
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

pub const DEFAULT_BIND: &str = "127.0.0.1:5176";
pub const DEFAULT_API_BASE_URL: &str = "https://9u6shrsot7.execute-api.ap-east-1.amazonaws.com";
const DEFAULT_API_TIMEOUT_SECS: u64 = 10;
const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 5;
const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;

// Environment overrides
pub const ENV_BIND: &str = "GEOLANG_BIND";
pub const ENV_API_BASE_URL: &str = "GEOLANG_API_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "GEOLANG_LOG_LEVEL";
pub const ENV_PREFERENCES_PATH: &str = "GEOLANG_PREFERENCES_PATH";

/// Main Application Configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub api: ApiConfig,
    pub geolocation: GeolocationConfig,
    pub preferences: PreferencesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind: String,
    pub security_headers: bool,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GeolocationConfig {
    pub providers: Vec<GeoProviderConfig>,
    pub max_body_bytes: usize,
    pub timeout: Duration,
}

/// One client-side lookup provider: where to ask and which field holds the country.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct GeoProviderConfig {
    pub name: String,
    pub url: String,
    pub country_field: String,
}

#[derive(Debug, Clone, Default)]
pub struct PreferencesConfig {
    pub path: Option<PathBuf>,
}

/// Partial Application Configuration for loading from files
#[derive(Deserialize, Debug, Default)]
pub struct PartialAppConfig {
    server: Option<PartialServerConfig>,
    api: Option<PartialApiConfig>,
    geolocation: Option<PartialGeolocationConfig>,
    preferences: Option<PartialPreferencesConfig>,
    logging: Option<PartialLoggingConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialServerConfig {
    bind: Option<String>,
    security_headers: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialApiConfig {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialGeolocationConfig {
    providers: Option<Vec<GeoProviderConfig>>,
    max_body_bytes: Option<usize>,
    timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialPreferencesConfig {
    path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
struct PartialLoggingConfig {
    level: Option<String>,
    format: Option<String>,
}

pub fn default_providers() -> Vec<GeoProviderConfig> {
    [
        ("ipapi.co", "https://ipapi.co/json/", "country_code"),
        ("ipinfo.io", "https://ipinfo.io/json", "country"),
        (
            "ipgeolocation.io",
            "https://api.ipgeolocation.io/ipgeo?apiKey=free",
            "country_code2",
        ),
    ]
    .into_iter()
    .map(|(name, url, field)| GeoProviderConfig {
        name: name.to_string(),
        url: url.to_string(),
        country_field: field.to_string(),
    })
    .collect()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind: DEFAULT_BIND.to_string(),
                security_headers: true,
            },
            api: ApiConfig {
                base_url: DEFAULT_API_BASE_URL.to_string(),
                timeout: Duration::from_secs(DEFAULT_API_TIMEOUT_SECS),
            },
            geolocation: GeolocationConfig {
                providers: default_providers(),
                max_body_bytes: DEFAULT_MAX_BODY_BYTES,
                timeout: Duration::from_secs(DEFAULT_PROVIDER_TIMEOUT_SECS),
            },
            preferences: PreferencesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

fn env_value<'a>(env_map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    env_map
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, ConfigError> {
        ConfigLoader::new().load_config()
    }

    /// Load configuration with custom base path (for testing)
    pub fn load_with_base_path(base_path: PathBuf) -> Result<Self, ConfigError> {
        ConfigLoader::with_base_path(base_path).load_config()
    }

    /// Create AppConfig from partial config and environment
    pub fn from_partial_and_env(
        partial: Option<PartialAppConfig>,
        env_map: HashMap<String, String>,
    ) -> Result<Self, ConfigError> {
        let partial = partial.unwrap_or_default();
        let mut config = AppConfig::default();

        if let Some(server) = partial.server {
            if let Some(bind) = server.bind {
                config.server.bind = bind;
            }
            if let Some(enabled) = server.security_headers {
                config.server.security_headers = enabled;
            }
        }

        if let Some(api) = partial.api {
            if let Some(base_url) = api.base_url {
                config.api.base_url = base_url;
            }
            if let Some(secs) = api.timeout_secs {
                config.api.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(geo) = partial.geolocation {
            if let Some(providers) = geo.providers {
                config.geolocation.providers = providers;
            }
            if let Some(max) = geo.max_body_bytes {
                config.geolocation.max_body_bytes = max;
            }
            if let Some(secs) = geo.timeout_secs {
                config.geolocation.timeout = Duration::from_secs(secs);
            }
        }

        if let Some(prefs) = partial.preferences {
            config.preferences.path = prefs.path;
        }

        if let Some(logging) = partial.logging {
            if let Some(level) = logging.level {
                config.logging.level = parse_level(&level)?;
            }
            if let Some(format) = logging.format {
                config.logging.format = format
                    .parse::<LogFormat>()
                    .map_err(|_| ConfigError::FieldMissing("logging.format".to_string()))?;
            }
        }

        // Environment wins over the file
        if let Some(bind) = env_value(&env_map, ENV_BIND) {
            config.server.bind = bind.to_string();
        }
        if let Some(url) = env_value(&env_map, ENV_API_BASE_URL) {
            config.api.base_url = url.to_string();
        }
        if let Some(level) = env_value(&env_map, ENV_LOG_LEVEL) {
            config.logging.level = parse_level(level)?;
        }
        if let Some(path) = env_value(&env_map, ENV_PREFERENCES_PATH) {
            config.preferences.path = Some(PathBuf::from(path));
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::FieldMissing("api.base_url".to_string()));
        }
        self.bind_addr()?;
        for (index, provider) in self.geolocation.providers.iter().enumerate() {
            if provider.name.trim().is_empty()
                || provider.url.trim().is_empty()
                || provider.country_field.trim().is_empty()
            {
                return Err(ConfigError::FieldMissing(format!(
                    "geolocation.providers[{index}]"
                )));
            }
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.server
            .bind
            .parse()
            .map_err(|_| ConfigError::InvalidBind(self.server.bind.clone()))
    }

    /// Where the language preference is persisted.
    pub fn preferences_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.preferences.path {
            return Ok(path.clone());
        }
        dirs::home_dir()
            .map(|home| home.join(USER_CONFIG_PATH).join(PREFERENCES_FILE_NAME))
            .ok_or(ConfigError::NoConfigDir)
    }
}

fn parse_level(raw: &str) -> Result<tracing::Level, ConfigError> {
    raw.parse::<tracing::Level>()
        .map_err(|_| ConfigError::FieldMissing("logging.level".to_string()))
}
