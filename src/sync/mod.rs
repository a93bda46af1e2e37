//! Coin reconciliation pipeline
//!
//! - [`collector`] - Exhaustive, deduplicated pagination over the coin list
//! - [`executor`] - Bounded-concurrency batch runner with outcome aggregation
//! - [`progress`] - Throughput and milestone snapshots for executor runs
//! - [`orchestrator`] - Load → verify → reload → deploy run

pub mod collector;
pub mod executor;
pub mod orchestrator;
pub mod progress;

pub use collector::PaginatedCollector;
pub use executor::{Aggregate, BatchExecutor, BatchRange, ExecutionReport, ExecutorConfig};
pub use orchestrator::{SyncOptions, SyncOrchestrator};
pub use progress::{ProgressConfig, ProgressSnapshot, ProgressTracker};
