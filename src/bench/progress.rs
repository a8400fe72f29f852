//! Progress and cancellation primitives
//!
//! The phase executors only see [`ProgressChannel`]; whatever hosts the
//! worker decides where marks and percentages go.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::config::BenchmarkConfig;
use crate::models::DiskMark;

/// The three primitives a phase needs from the worker host
pub trait ProgressChannel: Send {
    /// Hand a completed mark to the consumer
    fn publish(&mut self, mark: &DiskMark);

    /// Overall completion, 0..=100
    fn set_progress(&mut self, percent: u8);

    /// Polled before each mark
    fn is_cancelled(&self) -> bool;
}

/// Cooperative cancellation flag shared between a worker and its host
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Block-level completion counter spanning every phase of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressTracker {
    completed: u64,
    total: u64,
}

impl ProgressTracker {
    pub fn new(total: u64) -> Self {
        Self {
            completed: 0,
            total,
        }
    }

    pub fn for_config(config: &BenchmarkConfig) -> Self {
        Self::new(config.total_units())
    }

    /// Count one finished block and return the new percentage
    pub fn advance(&mut self) -> u8 {
        self.completed += 1;
        self.percent()
    }

    pub fn percent(&self) -> u8 {
        if self.total == 0 {
            return 0;
        }
        (self.completed.saturating_mul(100) / self.total).min(100) as u8
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn total(&self) -> u64 {
        self.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_token_is_shared() {
        let token = CancelToken::new();
        let clone = token.clone();
        assert!(!clone.is_cancelled());
        token.cancel();
        assert!(clone.is_cancelled());
    }

    #[test]
    fn test_tracker_spans_phases() {
        let config = BenchmarkConfig::default()
            .with_num_marks(2)
            .with_num_blocks(4)
            .with_read_test(true)
            .with_write_test(true);
        let mut tracker = ProgressTracker::for_config(&config);
        assert_eq!(tracker.total(), 16);

        // write phase finishes at the halfway point
        let after_write: Vec<u8> = (0..8).map(|_| tracker.advance()).collect();
        assert_eq!(after_write.last(), Some(&50));
        assert!(after_write.windows(2).all(|w| w[0] <= w[1]));

        for _ in 0..8 {
            tracker.advance();
        }
        assert_eq!(tracker.percent(), 100);
        assert_eq!(tracker.completed(), 16);
    }

    #[test]
    fn test_tracker_truncates_and_clamps() {
        let mut tracker = ProgressTracker::new(3);
        assert_eq!(tracker.advance(), 33);
        assert_eq!(tracker.advance(), 66);
        assert_eq!(tracker.advance(), 100);
        assert_eq!(tracker.advance(), 100);
        assert_eq!(ProgressTracker::new(0).percent(), 0);
    }
}
