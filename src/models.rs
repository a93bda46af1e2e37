// Core data structures for coinsync

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Coin record as served by the coin service
///
/// Only `id`, `verified` and `deployedPool` drive the sync; the descriptive
/// fields are kept for logging and inspection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Coin {
    pub id: i64,
    #[serde(default)]
    pub verified: bool,
    #[serde(rename = "deployedPool", default)]
    pub deployed_pool: Option<String>, // LP token address once a pool exists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(
        rename = "contractAddress",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub contract_address: Option<String>,
    #[serde(default)]
    pub graduated: bool,
}

impl Coin {
    /// Minimal coin with the fields the sync cares about
    pub fn new(id: i64, verified: bool, deployed_pool: Option<&str>) -> Self {
        Self {
            id,
            verified,
            deployed_pool: deployed_pool.map(str::to_string),
            ..Default::default()
        }
    }

    /// True while no trading pool has been deployed for this coin
    pub fn is_candidate(&self) -> bool {
        self.deployed_pool.is_none()
    }
}

/// Deduplicated point-in-time view of the remote coin collection
///
/// Keyed by coin id. Merging a page overwrites existing entries, so the
/// latest fetched attributes win.
#[derive(Debug, Clone, Default)]
pub struct CoinSnapshot {
    coins: HashMap<i64, Coin>,
}

impl CoinSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one fetched page, returning how many ids were not seen before
    pub fn merge_page(&mut self, page: Vec<Coin>) -> usize {
        let mut added = 0;
        for coin in page {
            if self.coins.insert(coin.id, coin).is_none() {
                added += 1;
            }
        }
        added
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn get(&self, id: i64) -> Option<&Coin> {
        self.coins.get(&id)
    }

    /// Smallest id held, used as the pagination cursor
    pub fn min_id(&self) -> Option<i64> {
        self.coins.keys().copied().min()
    }

    /// Number of coins the service reports as verified
    pub fn verified_count(&self) -> usize {
        self.coins.values().filter(|c| c.verified).count()
    }

    /// Number of coins that already have a deployed pool
    pub fn deployed_count(&self) -> usize {
        self.coins.values().filter(|c| !c.is_candidate()).count()
    }

    /// All coins, newest (highest id) first
    pub fn into_sorted_desc(self) -> Vec<Coin> {
        let mut coins: Vec<Coin> = self.coins.into_values().collect();
        coins.sort_by(|a, b| b.id.cmp(&a.id));
        coins
    }

    /// Coins without a deployed pool, newest first
    pub fn candidates(&self) -> Vec<Coin> {
        let mut coins: Vec<Coin> = self
            .coins
            .values()
            .filter(|c| c.is_candidate())
            .cloned()
            .collect();
        coins.sort_by(|a, b| b.id.cmp(&a.id));
        coins
    }
}

impl FromIterator<Coin> for CoinSnapshot {
    fn from_iter<I: IntoIterator<Item = Coin>>(iter: I) -> Self {
        let mut snapshot = Self::new();
        snapshot.merge_page(iter.into_iter().collect());
        snapshot
    }
}

/// Phases of one reconciliation run, strictly in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunPhase {
    Idle,
    Loading,
    Verifying,
    Reloading,
    Deploying,
    Done,
}

impl RunPhase {
    /// The phase that follows this one, `None` once done
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Idle => Some(Self::Loading),
            Self::Loading => Some(Self::Verifying),
            Self::Verifying => Some(Self::Reloading),
            Self::Reloading => Some(Self::Deploying),
            Self::Deploying => Some(Self::Done),
            Self::Done => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Verifying => "verifying",
            Self::Reloading => "reloading",
            Self::Deploying => "deploying",
            Self::Done => "done",
        }
    }
}

impl std::fmt::Display for RunPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a complete sync-and-deploy run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Coins that were unverified before a successful sync in this run
    pub verified: u64,

    /// Coins for which a deploy call succeeded
    pub deployed: u64,

    /// Size of the candidate set at load time
    pub total_considered: u64,

    /// Sync calls that failed during the verify phase
    pub verify_failures: u64,

    /// Coins whose sync or deploy failed during the deploy phase
    pub deploy_failures: u64,

    /// Wall time of the whole run
    #[serde(skip)]
    pub elapsed: Duration,
}

impl SyncReport {
    /// The `(verified, deployed, total_considered)` triple
    pub fn counts(&self) -> (u64, u64, u64) {
        (self.verified, self.deployed, self.total_considered)
    }
}
