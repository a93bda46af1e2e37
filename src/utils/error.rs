//! Error types for talking to the coin service
//!
//! Every remote call made by [`crate::client::HttpCoinClient`] reports failure
//! through [`ServiceError`].

use thiserror::Error;

/// Errors that can occur while calling the coin service
#[derive(Error, Debug)]
pub enum ServiceError {
    /// HTTP request error (connection refused, reset, TLS, ...)
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx status returned by the service
    #[error("Service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// Request timeout
    #[error("Request timeout")]
    Timeout,

    /// Response payload could not be decoded
    #[error("Decoding error: {0}")]
    Decode(String),

    /// Invalid base URL or path
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl ServiceError {
    /// Whether a failed call is worth repeating
    ///
    /// Retry on timeouts, connection failures and:
    /// - 429 (Too Many Requests)
    /// - 500 (Internal Server Error)
    /// - 502 (Bad Gateway)
    /// - 503 (Service Unavailable)
    /// - 504 (Gateway Timeout)
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout => true,
            Self::Http(e) => e.is_connect() || e.is_timeout(),
            Self::Status { status, .. } => matches!(status, 429 | 500 | 502 | 503 | 504),
            Self::Decode(_) | Self::InvalidUrl(_) => false,
        }
    }

    /// HTTP status code, when the service answered at all
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
