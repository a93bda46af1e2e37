//! HTTP implementation of the coin service client
//!
//! Thin wrapper around `reqwest` with:
//! - Base URL validation
//! - Request timeout and gzip
//! - Optional retry with exponential backoff (off by default)
//! - Status checking that keeps the response body for diagnostics

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use super::CoinService;
use crate::config::Config;
use crate::models::Coin;
use crate::utils::error::ServiceError;
use crate::utils::retry::{with_retry_if, RetryConfig};

/// `GET /coin/{id}` answers `{"coin": {...}}`; a bare coin is accepted too.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CoinEnvelope {
    Wrapped { coin: Coin },
    Bare(Coin),
}

impl CoinEnvelope {
    fn into_coin(self) -> Coin {
        match self {
            Self::Wrapped { coin } | Self::Bare(coin) => coin,
        }
    }
}

/// Coin service client over HTTP(S)
#[derive(Debug, Clone)]
pub struct HttpCoinClient {
    /// HTTP client with configured timeout and compression
    client: Client,

    /// API root without trailing slash, e.g. `https://hatch.vegas/api`
    base_url: String,

    /// Retry policy for retryable failures
    retry: RetryConfig,
}

impl HttpCoinClient {
    /// Create a client for `base_url` with the given request timeout
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::InvalidUrl` if `base_url` does not parse and
    /// `ServiceError::Http` if the HTTP client cannot be created
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ServiceError> {
        Self::build(
            base_url,
            timeout,
            &format!("coinsync/{}", env!("CARGO_PKG_VERSION")),
        )
    }

    /// Create a client from the service section of the configuration
    pub fn from_config(config: &Config) -> Result<Self, ServiceError> {
        let client = Self::build(
            &config.service.base_url,
            config.request_timeout(),
            &config.service.user_agent,
        )?;
        Ok(client.with_retry(config.retry_config()))
    }

    fn build(base_url: &str, timeout: Duration, user_agent: &str) -> Result<Self, ServiceError> {
        Url::parse(base_url).map_err(|e| ServiceError::InvalidUrl(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            retry: RetryConfig::default(),
        })
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// API root this client talks to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Send a request, retrying according to the configured policy
    async fn send<F>(&self, build: F) -> Result<Response, ServiceError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let build = &build;
        with_retry_if(
            &self.retry,
            move || async move {
                let response = build().send().await.map_err(map_send_error)?;
                check_status(response).await
            },
            ServiceError::is_retryable,
        )
        .await
    }

    async fn post(&self, id: i64, action: &str) -> Result<Response, ServiceError> {
        let url = self.url(&format!("/coin/{id}/{action}"));
        tracing::debug!(coin_id = id, action, "POST");
        self.send(|| self.client.post(&url)).await
    }
}

fn map_send_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Http(e)
    }
}

async fn check_status(response: Response) -> Result<Response, ServiceError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ServiceError::Status {
        status: status.as_u16(),
        body,
    })
}

async fn read_body(response: Response) -> Result<String, ServiceError> {
    response.text().await.map_err(map_send_error)
}

#[async_trait]
impl CoinService for HttpCoinClient {
    async fn list_coins(
        &self,
        limit: usize,
        max_id: Option<i64>,
    ) -> Result<Vec<Coin>, ServiceError> {
        let url = self.url("/coins");
        let mut query = vec![("limit", limit.to_string())];
        if let Some(max_id) = max_id {
            query.push(("maxId", max_id.to_string()));
        }

        tracing::debug!(limit, max_id = ?max_id, "GET /coins");
        let response = self.send(|| self.client.get(&url).query(&query)).await?;
        let body = read_body(response).await?;

        serde_json::from_str(&body)
            .map_err(|e| ServiceError::Decode(format!("coin list: {e}")))
    }

    async fn get_coin(&self, id: i64) -> Result<Coin, ServiceError> {
        let url = self.url(&format!("/coin/{id}"));
        let response = self.send(|| self.client.get(&url)).await?;
        let body = read_body(response).await?;

        serde_json::from_str::<CoinEnvelope>(&body)
            .map(CoinEnvelope::into_coin)
            .map_err(|e| ServiceError::Decode(format!("coin {id}: {e}")))
    }

    async fn sync_coin(&self, id: i64) -> Result<String, ServiceError> {
        let response = self.post(id, "sync").await?;
        read_body(response).await
    }

    async fn deploy_coin(&self, id: i64) -> Result<(), ServiceError> {
        self.post(id, "deploy").await?;
        Ok(())
    }
}
