use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Config fetch error: {0}")]
    ConfigFetch(#[from] ConfigFetchError),
    #[error("Preference storage error: {0}")]
    Storage(#[from] StorageError),
    #[error("Server error: {0}")]
    Server(String),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read file '{0}': {1}")]
    FileRead(String, #[source] std::io::Error),
    #[error("Failed to parse TOML from file '{0}': {1}")]
    TomlParse(String, #[source] toml::de::Error),
    #[error("Required configuration field '{0}' is missing or invalid")]
    FieldMissing(String),
    #[error("Invalid bind address '{0}'")]
    InvalidBind(String),
    #[error("Could not determine the user configuration directory")]
    NoConfigDir,
}

/// Failure of a single geolocation provider. Isolated; the chain moves on.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} unreachable: {source}")]
    Unreachable {
        provider: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{provider} responded with HTTP {status}")]
    Status { provider: String, status: u16 },
    #[error("{provider} response could not be parsed: {reason}")]
    ParseFailure { provider: String, reason: String },
    #[error("{provider} response carried no country code")]
    MissingCountry { provider: String },
}

/// Failure of one configuration fetch. Exactly one attempt is made per call.
#[derive(Debug, Error)]
pub enum ConfigFetchError {
    #[error("Network request failed: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Configuration API responded with HTTP {status_code}")]
    Status { status_code: u16 },
    #[error("Response data parsing failed: {0}")]
    Parse(String),
    #[error("Configuration API returned an error: {0}")]
    Api(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Failed to read preferences '{0}': {1}")]
    Read(String, #[source] std::io::Error),
    #[error("Failed to write preferences '{0}': {1}")]
    Write(String, #[source] std::io::Error),
    #[error("Preferences file '{0}' is corrupt: {1}")]
    Corrupt(String, #[source] serde_json::Error),
}

/// Why the server-side resolver fell back to the terminal default decision.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveFailure {
    #[error("header '{0}' is not valid text")]
    MalformedHeader(String),
    #[error("request target is malformed: {0}")]
    MalformedTarget(String),
    #[error("header access unavailable: {0}")]
    HeadersUnavailable(String),
}

pub type AppResult<T> = Result<T, AppError>;
