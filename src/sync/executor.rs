//! Bounded batch executor
//!
//! Runs an ordered list of items through an async per-item operation:
//!
//! ```text
//!  items ──▶ [batch 1] ──drain──▶ pause ──▶ [batch 2] ──drain──▶ ... ──▶ ExecutionReport
//!               │                              │
//!        semaphore(max_concurrency)     fresh semaphore
//!               │                              │
//!        tokio tasks ──outcomes──▶ single aggregation loop
//! ```
//!
//! Batches are dispatched strictly in order. Inside a batch completion order
//! is arbitrary, so aggregates must be commutative sums. A failing item (error
//! or panic) contributes the neutral `Default` outcome and is counted in
//! [`ExecutionReport::failed`]; it never stops the run.

use futures::FutureExt;
use std::fmt::{self, Display};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::progress::{ProgressConfig, ProgressSnapshot, ProgressTracker, SnapshotKind};

// ============================================================================
// Configuration
// ============================================================================

/// Executor configuration
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Maximum operations in flight at once
    pub max_concurrency: usize,

    /// Items per batch
    pub batch_size: usize,

    /// Sleep between batches
    pub batch_pause: Duration,

    /// Run batches concurrently; false processes items one at a time
    pub parallel: bool,

    /// Progress reporting
    pub progress: ProgressConfig,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 5,
            batch_size: 100,
            batch_pause: Duration::from_secs(2),
            parallel: true,
            progress: ProgressConfig::default(),
        }
    }
}

// ============================================================================
// Batches
// ============================================================================

/// Contiguous `[start, end)` slice of the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchRange {
    /// Zero-based batch number
    pub index: usize,
    pub start: usize,
    pub end: usize,
}

impl BatchRange {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Split `len` items into batches of at most `batch_size`
pub fn batch_ranges(len: usize, batch_size: usize) -> impl Iterator<Item = BatchRange> {
    let batch_size = batch_size.max(1);
    (0..len)
        .step_by(batch_size)
        .enumerate()
        .map(move |(index, start)| BatchRange {
            index,
            start,
            end: (start + batch_size).min(len),
        })
}

// ============================================================================
// Aggregation
// ============================================================================

/// Accumulator folded from per-item outcomes
///
/// Only the executor's drain loop calls [`Aggregate::absorb`], one outcome at
/// a time, so implementations need no synchronization.
pub trait Aggregate<O>: Default + Display + Send {
    fn absorb(&mut self, outcome: &O);
}

/// Counts `true` outcomes
impl Aggregate<bool> for u64 {
    fn absorb(&mut self, outcome: &bool) {
        if *outcome {
            *self += 1;
        }
    }
}

/// Result of one executor run
#[derive(Debug, Clone, Default)]
pub struct ExecutionReport<A> {
    /// Folded outcomes
    pub aggregate: A,

    /// Items that finished, successfully or not
    pub completed: u64,

    /// Items whose operation errored or panicked
    pub failed: u64,

    /// Wall time of the run
    pub elapsed: Duration,
}

impl<A> ExecutionReport<A> {
    /// Items whose operation returned `Ok`
    pub fn succeeded(&self) -> u64 {
        self.completed - self.failed
    }
}

enum ItemResult<O, E> {
    Done(O),
    Failed(E),
    Panicked(String),
}

impl<O, E> ItemResult<O, E> {
    fn from_caught(caught: std::thread::Result<Result<O, E>>) -> Self {
        match caught {
            Ok(Ok(outcome)) => Self::Done(outcome),
            Ok(Err(e)) => Self::Failed(e),
            Err(payload) => Self::Panicked(panic_message(payload.as_ref())),
        }
    }
}

/// Drain-side state: the only place outcomes are folded
struct Drain<A> {
    label: String,
    aggregate: A,
    completed: u64,
    failed: u64,
    progress: ProgressTracker,
}

impl<A> Drain<A> {
    fn settle<O, E>(&mut self, index: usize, result: ItemResult<O, E>)
    where
        O: Default,
        E: Display,
        A: Aggregate<O>,
    {
        let outcome = match result {
            ItemResult::Done(outcome) => outcome,
            ItemResult::Failed(e) => {
                tracing::warn!(label = %self.label, item = index, error = %e, "Item failed, skipping");
                self.failed += 1;
                O::default()
            }
            ItemResult::Panicked(msg) => {
                tracing::warn!(label = %self.label, item = index, panic = %msg, "Item panicked, skipping");
                self.failed += 1;
                O::default()
            }
        };

        self.aggregate.absorb(&outcome);
        self.completed += 1;

        for snapshot in self.progress.record(self.completed) {
            log_snapshot(&self.label, &snapshot, &self.aggregate);
        }
    }
}

/// One decimal place is plenty for log output
fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn log_snapshot<A: Display>(label: &str, snapshot: &ProgressSnapshot, aggregate: &A) {
    match snapshot.kind {
        SnapshotKind::Interval => tracing::info!(
            label,
            elapsed_secs = round1(snapshot.elapsed.as_secs_f64()),
            completed = snapshot.completed,
            total = snapshot.total,
            window = snapshot.window_completed,
            window_rate = round1(snapshot.window_rate),
            overall_rate = round1(snapshot.overall_rate),
            "Progress | {aggregate}"
        ),
        SnapshotKind::Milestone => tracing::info!(
            label,
            elapsed_secs = round1(snapshot.elapsed.as_secs_f64()),
            completed = snapshot.completed,
            total = snapshot.total,
            overall_rate = round1(snapshot.overall_rate),
            "Milestone | {aggregate}"
        ),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Runs items in bounded-concurrency batches
#[derive(Debug, Clone)]
pub struct BatchExecutor {
    config: ExecutorConfig,
    label: String,
}

impl BatchExecutor {
    pub fn new(config: ExecutorConfig) -> Self {
        Self {
            config,
            label: String::from("batch"),
        }
    }

    /// Name used in log lines, e.g. the phase being run
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Run `operation` over `items` and fold the outcomes into `A`
    pub async fn run<T, O, E, A, F, Fut>(&self, items: Vec<T>, operation: F) -> ExecutionReport<A>
    where
        T: Send + 'static,
        O: Default + Send + 'static,
        E: Display + Send + 'static,
        A: Aggregate<O>,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let total = items.len();
        let mut drain = Drain {
            label: self.label.clone(),
            aggregate: A::default(),
            completed: 0,
            failed: 0,
            progress: ProgressTracker::new(total as u64, self.config.progress.clone()),
        };

        let mode = if self.config.parallel {
            "parallel"
        } else {
            "sequential"
        };
        tracing::info!(
            label = %self.label,
            total,
            mode,
            max_concurrency = self.config.max_concurrency,
            batch_size = self.config.batch_size,
            "Starting run"
        );

        if self.config.parallel {
            self.run_parallel(items, operation, &mut drain).await;
        } else {
            self.run_sequential(items, operation, &mut drain).await;
        }

        let elapsed = drain.progress.elapsed();
        let overall_rate = crate::utils::rate_per_sec(drain.completed, elapsed.as_secs_f64());
        tracing::info!(
            label = %self.label,
            completed = drain.completed,
            failed = drain.failed,
            elapsed_secs = round1(elapsed.as_secs_f64()),
            overall_rate = round1(overall_rate),
            "Run complete | {}",
            drain.aggregate
        );

        ExecutionReport {
            aggregate: drain.aggregate,
            completed: drain.completed,
            failed: drain.failed,
            elapsed,
        }
    }

    async fn run_parallel<T, O, E, A, F, Fut>(&self, items: Vec<T>, operation: F, drain: &mut Drain<A>)
    where
        T: Send + 'static,
        O: Default + Send + 'static,
        E: Display + Send + 'static,
        A: Aggregate<O>,
        F: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<O, E>> + Send + 'static,
    {
        let total = items.len();
        let max_concurrency = self.config.max_concurrency.max(1);
        let batch_count = total.div_ceil(self.config.batch_size.max(1));
        let operation = Arc::new(operation);
        let mut remaining = items.into_iter();

        for range in batch_ranges(total, self.config.batch_size) {
            tracing::info!(
                label = %self.label,
                batch = range.index + 1,
                of = batch_count,
                first = range.start + 1,
                last = range.end,
                size = range.len(),
                "Processing batch"
            );

            // fresh pool per batch
            let semaphore = Arc::new(Semaphore::new(max_concurrency));
            let mut tasks = JoinSet::new();

            for (offset, item) in remaining.by_ref().take(range.len()).enumerate() {
                let index = range.start + offset;
                let semaphore = Arc::clone(&semaphore);
                let operation = Arc::clone(&operation);

                tasks.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    let caught = AssertUnwindSafe(operation(item)).catch_unwind().await;
                    (index, caught)
                });
            }

            while let Some(joined) = tasks.join_next().await {
                match joined {
                    Ok((index, caught)) => drain.settle(index, ItemResult::from_caught(caught)),
                    // tasks are never aborted and panics are caught inside them
                    Err(join_error) => drain.settle::<O, E>(
                        range.start,
                        ItemResult::Panicked(join_error.to_string()),
                    ),
                }
            }

            if range.end < total && !self.config.batch_pause.is_zero() {
                tracing::info!(
                    label = %self.label,
                    pause_ms = self.config.batch_pause.as_millis() as u64,
                    "Batch complete, pausing before next batch"
                );
                tokio::time::sleep(self.config.batch_pause).await;
            }
        }
    }

    async fn run_sequential<T, O, E, A, F, Fut>(&self, items: Vec<T>, operation: F, drain: &mut Drain<A>)
    where
        O: Default,
        E: Display,
        A: Aggregate<O>,
        F: Fn(T) -> Fut,
        Fut: Future<Output = Result<O, E>>,
    {
        for (index, item) in items.into_iter().enumerate() {
            let caught = AssertUnwindSafe(operation(item)).catch_unwind().await;
            drain.settle(index, ItemResult::from_caught(caught));
        }
    }
}

impl fmt::Display for BatchRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "batch {} [{}, {})", self.index + 1, self.start, self.end)
    }
}

// ============================================================================
// Tests
// ============================================================================
