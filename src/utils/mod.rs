//! Common utilities and helper functions

pub mod error;
pub mod retry;

/// Items per second, zero when no time has passed yet
#[must_use]
pub fn rate_per_sec(count: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs > 0.0 {
        count as f64 / elapsed_secs
    } else {
        0.0
    }
}
