//! Four-phase sync-and-deploy run
//!
//! ```text
//! Idle ─▶ Loading ─▶ Verifying ─▶ Reloading ─▶ Deploying ─▶ Done
//! ```
//!
//! - **Loading**: collect every coin, keep those without a deployed pool
//! - **Verifying**: sync each candidate, counting coins that were unverified
//! - **Reloading**: collect again, since syncing may have attached pools
//! - **Deploying**: sync each remaining candidate again and deploy the ones
//!   whose sync response carries the "pair not found" marker
//!
//! Service errors while loading or reloading end the run. Per-coin errors
//! while verifying or deploying are absorbed by the executor and the coin is
//! left for the next run.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;

use super::collector::PaginatedCollector;
use super::executor::{Aggregate, BatchExecutor, ExecutionReport, ExecutorConfig};
use crate::client::CoinService;
use crate::config::{Config, DEFAULT_DEPLOY_MARKER};
use crate::error::{Error, Result};
use crate::models::{Coin, RunPhase, SyncReport};
use crate::utils::error::ServiceError;

// ============================================================================
// Options
// ============================================================================

/// Settings for one orchestrated run
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Page size for collection passes
    pub page_size: usize,

    /// Batching and concurrency for the verify and deploy phases
    pub executor: ExecutorConfig,

    /// Sync response substring that triggers a deploy
    pub deploy_marker: String,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: 20_000,
            executor: ExecutorConfig::default(),
            deploy_marker: String::from(DEFAULT_DEPLOY_MARKER),
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.sync.page_size,
            executor: config.executor_config(),
            deploy_marker: config.sync.deploy_marker.clone(),
        }
    }
}

// ============================================================================
// Outcomes
// ============================================================================

/// A per-coin failure inside the verify or deploy phase
#[derive(Error, Debug)]
#[error("coin {coin_id}: {stage} failed: {source}")]
pub struct CoinFailure {
    pub coin_id: i64,
    pub stage: &'static str,
    #[source]
    pub source: ServiceError,
}

impl CoinFailure {
    fn new(coin_id: i64, stage: &'static str, source: ServiceError) -> Self {
        Self {
            coin_id,
            stage,
            source,
        }
    }
}

/// Result of syncing one coin in the verify phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyOutcome {
    /// The sync call succeeded
    pub synced: bool,

    /// The pre-sync snapshot had `verified = false`
    pub was_unverified: bool,
}

/// Verify phase totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VerifyTally {
    pub synced: u64,
    pub verified: u64,
}

impl Aggregate<VerifyOutcome> for VerifyTally {
    fn absorb(&mut self, outcome: &VerifyOutcome) {
        if outcome.synced {
            self.synced += 1;
            if outcome.was_unverified {
                self.verified += 1;
            }
        }
    }
}

impl fmt::Display for VerifyTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Synced: {}, Verified: {}", self.synced, self.verified)
    }
}

/// Result of one coin in the deploy phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployOutcome {
    /// The sync call succeeded
    pub synced: bool,

    /// The sync response carried the marker
    pub pair_missing: bool,

    /// The deploy call succeeded
    pub deployed: bool,
}

/// Deploy phase totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeployTally {
    pub synced: u64,
    pub pair_missing: u64,
    pub deployed: u64,
}

impl Aggregate<DeployOutcome> for DeployTally {
    fn absorb(&mut self, outcome: &DeployOutcome) {
        self.synced += u64::from(outcome.synced);
        self.pair_missing += u64::from(outcome.pair_missing);
        self.deployed += u64::from(outcome.deployed);
    }
}

impl fmt::Display for DeployTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Synced: {}, Pair missing: {}, Deployed: {}",
            self.synced, self.pair_missing, self.deployed
        )
    }
}

/// True when a sync response asks for a pool deploy
///
/// Only presence of the marker is interpreted.
pub fn needs_deploy(sync_body: &str, marker: &str) -> bool {
    sync_body.contains(marker)
}

// ============================================================================
// Orchestrator
// ============================================================================

/// Drives one reconciliation run against a [`CoinService`]
pub struct SyncOrchestrator<S: CoinService + 'static> {
    service: Arc<S>,
    options: SyncOptions,
    phase: RunPhase,
}

impl<S: CoinService + 'static> SyncOrchestrator<S> {
    pub fn new(service: Arc<S>, options: SyncOptions) -> Self {
        Self {
            service,
            options,
            phase: RunPhase::Idle,
        }
    }

    /// Current phase; `Done` after a successful run
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn advance(&mut self) {
        if let Some(next) = self.phase.next() {
            tracing::info!(from = %self.phase, to = %next, "Phase transition");
            self.phase = next;
        }
    }

    /// Run all four phases and return the counters
    ///
    /// # Errors
    ///
    /// Fails if the orchestrator already ran, or if a collection pass hits a
    /// service error. Per-coin errors never fail the run.
    pub async fn run(&mut self) -> Result<SyncReport> {
        if self.phase != RunPhase::Idle {
            return Err(Error::other(format!(
                "sync run already started (phase: {})",
                self.phase
            )));
        }

        let started = Instant::now();
        let mut report = SyncReport::default();

        self.advance(); // Loading
        let candidates = self.load_candidates().await?;
        report.total_considered = candidates.len() as u64;

        self.advance(); // Verifying
        let verify = self.verify(candidates).await;
        report.verified = verify.aggregate.verified;
        report.verify_failures = verify.failed;

        self.advance(); // Reloading
        let candidates = self.load_candidates().await?;

        self.advance(); // Deploying
        let deploy = self.deploy(candidates).await;
        report.deployed = deploy.aggregate.deployed;
        report.deploy_failures = deploy.failed;

        self.advance(); // Done
        report.elapsed = started.elapsed();

        tracing::info!(
            verified = report.verified,
            deployed = report.deployed,
            total = report.total_considered,
            verify_failures = report.verify_failures,
            deploy_failures = report.deploy_failures,
            elapsed_secs = report.elapsed.as_secs(),
            "Sync and deploy complete"
        );

        Ok(report)
    }

    /// Collect all coins and return the undeployed ones, newest first
    pub async fn load_candidates(&self) -> Result<Vec<Coin>> {
        let snapshot = PaginatedCollector::new(self.service.as_ref())
            .collect_all(self.options.page_size)
            .await?;

        let total = snapshot.len();
        let candidates = snapshot.candidates();
        tracing::info!(
            to_process = candidates.len(),
            total,
            skipped = total - candidates.len(),
            "Filtered coins (skipping already deployed)"
        );

        Ok(candidates)
    }

    /// Sync every coin, counting unverified → synced transitions
    pub async fn verify(&self, coins: Vec<Coin>) -> ExecutionReport<VerifyTally> {
        let service = Arc::clone(&self.service);

        BatchExecutor::new(self.options.executor.clone())
            .with_label(RunPhase::Verifying.as_str())
            .run(coins, move |coin: Coin| {
                let service = Arc::clone(&service);
                async move { verify_one(service.as_ref(), coin).await }
            })
            .await
    }

    /// Sync every coin and deploy those whose pair is missing
    pub async fn deploy(&self, coins: Vec<Coin>) -> ExecutionReport<DeployTally> {
        let service = Arc::clone(&self.service);
        let marker: Arc<str> = Arc::from(self.options.deploy_marker.as_str());

        BatchExecutor::new(self.options.executor.clone())
            .with_label(RunPhase::Deploying.as_str())
            .run(coins, move |coin: Coin| {
                let service = Arc::clone(&service);
                let marker = Arc::clone(&marker);
                async move { deploy_one(service.as_ref(), coin, &marker).await }
            })
            .await
    }
}

/// Verify phase operation for one coin
async fn verify_one<S: CoinService + ?Sized>(
    service: &S,
    coin: Coin,
) -> std::result::Result<VerifyOutcome, CoinFailure> {
    service
        .sync_coin(coin.id)
        .await
        .map_err(|e| CoinFailure::new(coin.id, "sync", e))?;

    tracing::debug!(coin_id = coin.id, was_unverified = !coin.verified, "Synced coin");
    Ok(VerifyOutcome {
        synced: true,
        was_unverified: !coin.verified,
    })
}

/// Deploy phase operation for one coin
async fn deploy_one<S: CoinService + ?Sized>(
    service: &S,
    coin: Coin,
    marker: &str,
) -> std::result::Result<DeployOutcome, CoinFailure> {
    let body = service
        .sync_coin(coin.id)
        .await
        .map_err(|e| CoinFailure::new(coin.id, "sync", e))?;

    if !needs_deploy(&body, marker) {
        return Ok(DeployOutcome {
            synced: true,
            ..DeployOutcome::default()
        });
    }

    service
        .deploy_coin(coin.id)
        .await
        .map_err(|e| CoinFailure::new(coin.id, "deploy", e))?;

    tracing::info!(coin_id = coin.id, "Deployed coin");
    Ok(DeployOutcome {
        synced: true,
        pair_missing: true,
        deployed: true,
    })
}
