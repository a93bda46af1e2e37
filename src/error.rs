//! Unified error handling for the coinsync crate
//!
//! Domain errors (currently [`ServiceError`]) are wrapped by the crate-level
//! [`Error`] so that loading, configuration and CLI code share one type.
//!
//! # Architecture
//!
//! - [`SyncErrorTrait`] - Common interface implemented by all error types
//! - [`ErrorCategory`] - Classification of errors for handling strategies
//! - [`Error`] - Unified error enum wrapping all domain-specific errors

use std::io;
use thiserror::Error;

pub use crate::utils::error::ServiceError;

/// Common trait for all coinsync error types
pub trait SyncErrorTrait: std::error::Error {
    /// Check if this error is recoverable (a later attempt may succeed)
    fn is_recoverable(&self) -> bool;

    /// Get the error category for handling strategies
    fn category(&self) -> ErrorCategory;
}

/// Classification of errors for handling strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Connection failures, timeouts, retryable statuses
    Network,
    /// Non-2xx answers and undecodable payloads
    Protocol,
    /// Configuration and validation errors
    Config,
    /// Other/unknown errors
    Other,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::Protocol => "protocol",
            Self::Config => "config",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SyncErrorTrait for ServiceError {
    fn is_recoverable(&self) -> bool {
        self.is_retryable()
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Http(_) | Self::Timeout => ErrorCategory::Network,
            Self::Status { .. } | Self::Decode(_) => ErrorCategory::Protocol,
            Self::InvalidUrl(_) => ErrorCategory::Config,
        }
    }
}

/// Unified error type for the coinsync crate
#[derive(Error, Debug)]
pub enum Error {
    /// Coin service errors
    #[error("Service error: {0}")]
    Service(#[from] ServiceError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parsing errors
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}")]
    Other {
        context: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl SyncErrorTrait for Error {
    fn is_recoverable(&self) -> bool {
        match self {
            Self::Service(e) => e.is_recoverable(),
            Self::Io(_) => true,
            Self::Json(_) | Self::Toml(_) | Self::Config(_) | Self::Other { .. } => false,
        }
    }

    fn category(&self) -> ErrorCategory {
        match self {
            Self::Service(e) => e.category(),
            Self::Json(_) => ErrorCategory::Protocol,
            Self::Toml(_) | Self::Config(_) => ErrorCategory::Config,
            Self::Io(_) | Self::Other { .. } => ErrorCategory::Other,
        }
    }
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a generic error with context
    pub fn other(context: impl Into<String>) -> Self {
        Self::Other {
            context: context.into(),
            source: None,
        }
    }

    /// Create a generic error with context and source
    pub fn with_source(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Other {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }
}

/// Result type alias using the unified Error type
pub type Result<T> = std::result::Result<T, Error>;
