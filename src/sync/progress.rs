//! Progress tracking for batch runs
//!
//! Produces two kinds of snapshots while items complete:
//! - interval reports every `log_interval`, carrying the rate over the last
//!   window and the cumulative rate since the start
//! - milestone reports every `milestone_every` completed items
//!
//! Snapshots are purely observational. The tracker never influences
//! scheduling or counts.

use std::time::{Duration, Instant};

use crate::utils::rate_per_sec;

/// Progress reporting settings
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Time between interval reports
    pub log_interval: Duration,

    /// Completed items between milestone reports
    pub milestone_every: u64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            log_interval: Duration::from_secs(30),
            milestone_every: 1000,
        }
    }
}

/// Why a snapshot was taken
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotKind {
    Interval,
    Milestone,
}

/// Point-in-time progress figures
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSnapshot {
    pub kind: SnapshotKind,

    /// Items completed so far
    pub completed: u64,

    /// Items in the run
    pub total: u64,

    /// Items completed since the previous interval report
    pub window_completed: u64,

    /// `window_completed` per second of the window
    pub window_rate: f64,

    /// `completed` per second since the start
    pub overall_rate: f64,

    /// Time since the start
    pub elapsed: Duration,
}

/// Rolling progress state for one executor run
#[derive(Debug)]
pub struct ProgressTracker {
    config: ProgressConfig,
    total: u64,
    started: Instant,
    last_report: Instant,
    last_completed: u64,
}

impl ProgressTracker {
    pub fn new(total: u64, config: ProgressConfig) -> Self {
        Self::starting_at(total, config, Instant::now())
    }

    /// Tracker whose clock starts at `started`
    pub fn starting_at(total: u64, config: ProgressConfig, started: Instant) -> Self {
        Self {
            config,
            total,
            started,
            last_report: started,
            last_completed: 0,
        }
    }

    /// Record that `completed` items are done now
    pub fn record(&mut self, completed: u64) -> Vec<ProgressSnapshot> {
        self.record_at(completed, Instant::now())
    }

    /// Record that `completed` items are done at `now`
    ///
    /// Returns zero, one or two snapshots (an interval report and/or a
    /// milestone).
    pub fn record_at(&mut self, completed: u64, now: Instant) -> Vec<ProgressSnapshot> {
        let mut snapshots = Vec::new();
        let elapsed = now.saturating_duration_since(self.started);
        let overall_rate = rate_per_sec(completed, elapsed.as_secs_f64());

        let window = now.saturating_duration_since(self.last_report);
        if !self.config.log_interval.is_zero() && window >= self.config.log_interval {
            let window_completed = completed.saturating_sub(self.last_completed);
            snapshots.push(ProgressSnapshot {
                kind: SnapshotKind::Interval,
                completed,
                total: self.total,
                window_completed,
                window_rate: rate_per_sec(window_completed, window.as_secs_f64()),
                overall_rate,
                elapsed,
            });
            self.last_report = now;
            self.last_completed = completed;
        }

        if self.config.milestone_every > 0 && completed > 0 && completed % self.config.milestone_every == 0
        {
            snapshots.push(ProgressSnapshot {
                kind: SnapshotKind::Milestone,
                completed,
                total: self.total,
                window_completed: 0,
                window_rate: 0.0,
                overall_rate,
                elapsed,
            });
        }

        snapshots
    }

    /// Time since the tracker started
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}
