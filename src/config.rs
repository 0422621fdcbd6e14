use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use validator::{Validate, ValidationError};

pub const DEFAULT_BASE_URL: &str = "https://discordapp.com/api/v6";
pub const DEFAULT_MAX_RETRIES: u32 = 5;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[validate(schema(function = "validate_backoff_range"))]
pub struct Config {
    /// Base URL every route path is appended to
    #[validate(url)]
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bot token sent as `Authorization: Bot <token>`
    #[validate(length(min = 1, message = "token cannot be empty"))]
    pub token: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Retries after the first attempt for transient failures
    #[validate(range(max = 10))]
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Lower bound of the random delay between retries
    #[serde(with = "humantime_serde", default = "default_backoff_min")]
    pub backoff_min: Duration,

    /// Upper bound of the random delay between retries
    #[serde(with = "humantime_serde", default = "default_backoff_max")]
    pub backoff_max: Duration,

    #[serde(with = "humantime_serde", default = "default_request_timeout")]
    pub request_timeout: Duration,

    #[serde(with = "humantime_serde", default = "default_connect_timeout")]
    pub connect_timeout: Duration,

    #[serde(default = "default_pool_max_idle_per_host")]
    pub pool_max_idle_per_host: usize,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_user_agent() -> String {
    format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_min() -> Duration {
    Duration::from_millis(500)
}

fn default_backoff_max() -> Duration {
    Duration::from_secs(5)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_pool_max_idle_per_host() -> usize {
    50
}

fn default_log_level() -> String {
    "info".to_string()
}

fn validate_backoff_range(config: &Config) -> std::result::Result<(), ValidationError> {
    if config.backoff_min > config.backoff_max {
        return Err(ValidationError::new("backoff_range")
            .with_message("backoff_min must not exceed backoff_max".into()));
    }
    Ok(())
}

impl Config {
    /// Configuration with defaults for everything but the token
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            base_url: default_base_url(),
            token: token.into(),
            user_agent: default_user_agent(),
            max_retries: default_max_retries(),
            backoff_min: default_backoff_min(),
            backoff_max: default_backoff_max(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            pool_max_idle_per_host: default_pool_max_idle_per_host(),
            log_level: default_log_level(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Parse a JSON document, filling absent fields with defaults
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Check the configuration for consistency and correctness
    pub fn check(&self) -> Result<()> {
        Validate::validate(self).map_err(|e| Error::Configuration(e.to_string()))
    }

    /// Value of the fixed `Authorization` header
    pub fn authorization(&self) -> String {
        format!("Bot {}", self.token)
    }
}
