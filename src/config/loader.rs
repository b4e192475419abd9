use std::{collections::HashMap, env, fs, path::PathBuf};
use tracing::debug;

use crate::errors::ConfigError;

use super::app_config::{AppConfig, PartialAppConfig, CONFIG_FILE_NAME, USER_CONFIG_PATH};

const ENV_PREFIX: &str = "GEOLANG_";

/// Configuration loader responsible for loading config from files and environment
pub struct ConfigLoader {
    base_path: Option<PathBuf>,
    explicit_file: Option<PathBuf>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new config loader with default paths
    pub fn new() -> Self {
        Self {
            base_path: None,
            explicit_file: None,
        }
    }

    /// Create a config loader with custom base path (for testing)
    pub fn with_base_path(base_path: PathBuf) -> Self {
        Self {
            base_path: Some(base_path),
            explicit_file: None,
        }
    }

    /// Read exactly this file; it must exist.
    pub fn with_file(path: PathBuf) -> Self {
        Self {
            base_path: None,
            explicit_file: Some(path),
        }
    }

    /// Load complete application configuration
    pub fn load_config(&self) -> Result<AppConfig, ConfigError> {
        let partial = match &self.explicit_file {
            Some(path) => Some(self.read_partial(path)?),
            None => {
                let path = self.user_config_path()?;
                if path.exists() {
                    Some(self.read_partial(&path)?)
                } else {
                    debug!(path = %path.display(), "no config file, using defaults");
                    None
                }
            }
        };

        AppConfig::from_partial_and_env(partial, self.collect_env_vars())
    }

    /// Path of the user configuration file
    pub fn user_config_path(&self) -> Result<PathBuf, ConfigError> {
        let base = match &self.base_path {
            Some(base_path) => base_path.clone(),
            None => dirs::home_dir().ok_or(ConfigError::NoConfigDir)?,
        };
        Ok(base.join(USER_CONFIG_PATH).join(CONFIG_FILE_NAME))
    }

    fn read_partial(&self, path: &PathBuf) -> Result<PartialAppConfig, ConfigError> {
        let path_str = path.display().to_string();
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path_str.clone(), e))?;
        debug!(path = %path_str, "loaded config file");
        toml::from_str(&content).map_err(|e| ConfigError::TomlParse(path_str, e))
    }

    fn collect_env_vars(&self) -> HashMap<String, String> {
        env::vars().filter(|(k, _)| k.starts_with(ENV_PREFIX)).collect()
    }
}
