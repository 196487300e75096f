//! services/client/src/config.rs
//!
//! Defines the client's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
    #[error("Could not build the HTTP client: {0}")]
    HttpClient(String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    /// Base URL of the backend, including the `/api` prefix.
    pub api_url: String,
    /// Directory holding the local session/profile cache.
    pub data_dir: PathBuf,
    pub log_level: Level,
    pub request_timeout: Duration,
    pub health_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:5000/api".to_string(),
            data_dir: PathBuf::from("./.orbit"),
            log_level: Level::INFO,
            // Resume parsing and eligibility reasoning are LLM-bound.
            request_timeout: Duration::from_secs(120),
            health_timeout: Duration::from_secs(5),
            max_retries: 2,
            retry_backoff: Duration::from_millis(250),
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        let defaults = Config::default();

        // --- Backend ---
        let api_url = std::env::var("ORBIT_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);
        if !(api_url.starts_with("http://") || api_url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue(
                "ORBIT_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", api_url),
            ));
        }

        let data_dir = std::env::var("ORBIT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        // --- Gateway policy ---
        let request_timeout =
            parse_var::<u64>("ORBIT_TIMEOUT_SECS")?.map_or(defaults.request_timeout, Duration::from_secs);
        let health_timeout = parse_var::<u64>("ORBIT_HEALTH_TIMEOUT_SECS")?
            .map_or(defaults.health_timeout, Duration::from_secs);
        let max_retries = parse_var::<u32>("ORBIT_MAX_RETRIES")?.unwrap_or(defaults.max_retries);
        let retry_backoff = parse_var::<u64>("ORBIT_RETRY_BACKOFF_MS")?
            .map_or(defaults.retry_backoff, Duration::from_millis);

        Ok(Self {
            api_url,
            data_dir,
            log_level,
            request_timeout,
            health_timeout,
            max_retries,
            retry_backoff,
        })
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(None),
    }
}
