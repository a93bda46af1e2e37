//! Configuration management for coinsync
//!
//! This module handles loading and validating configuration from environment
//! variables and TOML files. Command-line flags override individual values in
//! `main.rs`.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::sync::executor::ExecutorConfig;
use crate::sync::progress::ProgressConfig;
use crate::utils::retry::RetryConfig;

/// Default coin service endpoint
pub const DEFAULT_BASE_URL: &str = "https://hatch.vegas/api";

/// Marker the service puts in a sync response when no trading pair exists
pub const DEFAULT_DEPLOY_MARKER: &str = "PairNotFound";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Coin service connection
    pub service: ServiceConfig,

    /// Pagination and batching
    pub sync: SyncConfig,

    /// Progress reporting
    pub progress: ProgressSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Coin service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Base URL of the coin API, e.g. `https://hatch.vegas/api`
    pub base_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Extra attempts for retryable failures (0 = single attempt)
    pub max_retries: u32,

    /// Base delay for exponential backoff in milliseconds
    pub retry_base_delay_ms: u64,

    /// User agent string
    pub user_agent: String,
}

/// Sync run settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Page size for `GET /coins`
    pub page_size: usize,

    /// Maximum in-flight requests within a batch
    pub max_concurrent_requests: usize,

    /// Coins per batch
    pub batch_size: usize,

    /// Pause between batches in milliseconds
    pub batch_pause_ms: u64,

    /// Process batches concurrently; false runs one coin at a time
    pub parallel: bool,

    /// Substring of the sync response that triggers a deploy
    pub deploy_marker: String,
}

/// Progress report settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressSettings {
    /// Seconds between throughput reports
    pub log_interval_secs: u64,

    /// Completed items between milestone reports
    pub milestone_every: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            request_timeout_secs: 30,
            max_retries: 0,
            retry_base_delay_ms: 1000,
            user_agent: format!("coinsync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            page_size: 20_000,
            max_concurrent_requests: 5,
            batch_size: 100,
            batch_pause_ms: 2000,
            parallel: true,
            deploy_marker: String::from(DEFAULT_DEPLOY_MARKER),
        }
    }
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            log_interval_secs: 30,
            milestone_every: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse::<T>().ok())
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Unset or unparseable variables fall back to the defaults.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let service = ServiceConfig {
            base_url: std::env::var("COINSYNC_BASE_URL").unwrap_or(defaults.service.base_url),
            request_timeout_secs: env_parse("COINSYNC_REQUEST_TIMEOUT")
                .unwrap_or(defaults.service.request_timeout_secs),
            max_retries: env_parse("COINSYNC_MAX_RETRIES").unwrap_or(defaults.service.max_retries),
            retry_base_delay_ms: env_parse("COINSYNC_RETRY_BASE_DELAY_MS")
                .unwrap_or(defaults.service.retry_base_delay_ms),
            user_agent: std::env::var("COINSYNC_USER_AGENT")
                .unwrap_or(defaults.service.user_agent),
        };

        let sync = SyncConfig {
            page_size: env_parse("COINSYNC_PAGE_SIZE").unwrap_or(defaults.sync.page_size),
            max_concurrent_requests: env_parse("COINSYNC_MAX_CONCURRENT_REQUESTS")
                .unwrap_or(defaults.sync.max_concurrent_requests),
            batch_size: env_parse("COINSYNC_BATCH_SIZE").unwrap_or(defaults.sync.batch_size),
            batch_pause_ms: env_parse("COINSYNC_BATCH_PAUSE_MS")
                .unwrap_or(defaults.sync.batch_pause_ms),
            parallel: env_parse("COINSYNC_PARALLEL").unwrap_or(defaults.sync.parallel),
            deploy_marker: std::env::var("COINSYNC_DEPLOY_MARKER")
                .unwrap_or(defaults.sync.deploy_marker),
        };

        let progress = ProgressSettings {
            log_interval_secs: env_parse("COINSYNC_LOG_INTERVAL_SECS")
                .unwrap_or(defaults.progress.log_interval_secs),
            milestone_every: env_parse("COINSYNC_MILESTONE_EVERY")
                .unwrap_or(defaults.progress.milestone_every),
        };

        let logging = LoggingConfig {
            level: std::env::var("COINSYNC_LOG_LEVEL").unwrap_or(defaults.logging.level),
            format: std::env::var("COINSYNC_LOG_FORMAT").unwrap_or(defaults.logging.format),
        };

        Ok(Self {
            service,
            sync,
            progress,
            logging,
        })
    }

    /// Load configuration from a TOML file
    ///
    /// Missing sections and keys take their default values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::with_source(
                format!("Failed to read config file: {}", path.display()),
                e,
            )
        })?;

        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.service.base_url)
            .map_err(|e| Error::config(format!("invalid base_url {}: {e}", self.service.base_url)))?;

        if self.sync.page_size == 0 {
            return Err(Error::config("page_size must be greater than 0"));
        }

        if self.sync.max_concurrent_requests == 0 {
            return Err(Error::config(
                "max_concurrent_requests must be greater than 0",
            ));
        }

        if self.sync.batch_size == 0 {
            return Err(Error::config("batch_size must be greater than 0"));
        }

        if self.sync.deploy_marker.is_empty() {
            return Err(Error::config("deploy_marker must not be empty"));
        }

        if self.progress.milestone_every == 0 {
            return Err(Error::config("milestone_every must be greater than 0"));
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.service.request_timeout_secs)
    }

    /// Retry policy for the coin service client
    #[must_use]
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.service.max_retries,
            base_delay_ms: self.service.retry_base_delay_ms,
            ..RetryConfig::default()
        }
    }

    /// Batch executor settings
    #[must_use]
    pub fn executor_config(&self) -> ExecutorConfig {
        ExecutorConfig {
            max_concurrency: self.sync.max_concurrent_requests,
            batch_size: self.sync.batch_size,
            batch_pause: Duration::from_millis(self.sync.batch_pause_ms),
            parallel: self.sync.parallel,
            progress: ProgressConfig {
                log_interval: Duration::from_secs(self.progress.log_interval_secs),
                milestone_every: self.progress.milestone_every,
            },
        }
    }
}
