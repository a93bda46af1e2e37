//! Coin service client
//!
//! [`CoinService`] is the only way the rest of the crate talks to the
//! backend. [`HttpCoinClient`] implements it over HTTP; tests drive the
//! collector and orchestrator with in-memory implementations.

pub mod http;

use async_trait::async_trait;

use crate::models::Coin;
use crate::utils::error::ServiceError;

pub use http::HttpCoinClient;

/// Remote operations exposed by the coin service
///
/// Every method maps one-to-one onto an endpoint. Implementations must not
/// retry on their own unless configured to, and must report any non-2xx
/// answer as an error.
#[async_trait]
pub trait CoinService: Send + Sync {
    /// `GET /coins?limit=N&maxId=M`
    ///
    /// Returns at most `limit` coins in descending id order, restricted to
    /// ids `<= max_id` when a cursor is given.
    async fn list_coins(
        &self,
        limit: usize,
        max_id: Option<i64>,
    ) -> Result<Vec<Coin>, ServiceError>;

    /// `GET /coin/{id}`
    async fn get_coin(&self, id: i64) -> Result<Coin, ServiceError>;

    /// `POST /coin/{id}/sync`, returning the raw response body
    async fn sync_coin(&self, id: i64) -> Result<String, ServiceError>;

    /// `POST /coin/{id}/deploy`
    async fn deploy_coin(&self, id: i64) -> Result<(), ServiceError>;
}
