//! coinsync - coin sync and pool deployment driver
//!
//! Reconciles the coin collection held by the hatch backend: every coin is
//! synced (which verifies it as a side effect) and every coin whose trading
//! pair is missing gets a pool deployed.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - [`client`] - Coin service trait and its HTTP implementation
//! - [`sync`] - Paginated collection, batch execution and the four-phase run
//! - [`models`] - Coin records, snapshots and run reports
//! - [`config`] - Configuration management and settings
//! - [`error`] - Unified error type
//! - [`utils`] - Retry helper and shared utilities
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use coinsync::client::HttpCoinClient;
//! use coinsync::config::Config;
//! use coinsync::sync::{SyncOptions, SyncOrchestrator};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let client = Arc::new(HttpCoinClient::from_config(&config)?);
//!     let mut run = SyncOrchestrator::new(client, SyncOptions::from_config(&config));
//!     let report = run.run().await?;
//!     println!("verified {} deployed {}", report.verified, report.deployed);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod sync;
pub mod utils;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::client::{CoinService, HttpCoinClient};
    pub use crate::config::Config;
    pub use crate::error::{Error, ErrorCategory, Result, SyncErrorTrait};
    pub use crate::models::{Coin, CoinSnapshot, RunPhase, SyncReport};
    pub use crate::sync::{BatchExecutor, ExecutorConfig, PaginatedCollector, SyncOrchestrator};
}

// Direct re-exports for convenience
pub use models::{Coin, CoinSnapshot, SyncReport};
