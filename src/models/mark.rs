//! Mark data model
//!
//! A mark is one timed pass over `num_blocks` blocks. Marks carry the
//! running statistics of their run as they stood when the mark was
//! recorded, so a front end can show "this mark vs the run so far".

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::util::units::{calculate_throughput_mbps, display_string};

/// Direction of a benchmark phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IoMode {
    Read,
    Write,
}

impl fmt::Display for IoMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoMode::Read => write!(f, "READ"),
            IoMode::Write => write!(f, "WRITE"),
        }
    }
}

/// Order in which blocks are visited within a mark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BlockSequence {
    #[default]
    Sequential,
    Random,
}

impl fmt::Display for BlockSequence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockSequence::Sequential => write!(f, "SEQUENTIAL"),
            BlockSequence::Random => write!(f, "RANDOM"),
        }
    }
}

/// One timed unit of work
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskMark {
    pub mode: IoMode,
    /// Absolute mark index; also names the per-mark file in multi-file mode
    pub mark_number: u32,
    /// Bytes actually transferred during the mark
    pub bytes: u64,
    /// Wall-clock time of the block loop
    pub elapsed: Duration,
    /// Throughput of this mark alone
    pub bandwidth_mb_per_sec: f64,
    pub cumulative_min: f64,
    pub cumulative_max: f64,
    pub cumulative_avg: f64,
}

impl DiskMark {
    /// Start tracking a new mark. Bandwidth and cumulative fields stay zero
    /// until [`DiskMark::complete`] is called.
    pub fn new(mode: IoMode, mark_number: u32) -> Self {
        Self {
            mode,
            mark_number,
            bytes: 0,
            elapsed: Duration::ZERO,
            bandwidth_mb_per_sec: 0.0,
            cumulative_min: 0.0,
            cumulative_max: 0.0,
            cumulative_avg: 0.0,
        }
    }

    /// Set the byte count and duration once every block has finished, and
    /// derive the mark's bandwidth from them.
    pub fn complete(&mut self, bytes: u64, elapsed: Duration) {
        self.bytes = bytes;
        self.elapsed = elapsed;
        self.bandwidth_mb_per_sec = calculate_throughput_mbps(bytes, elapsed);
    }

    pub fn megabytes(&self) -> f64 {
        self.bytes as f64 / crate::MEGABYTE as f64
    }

    pub fn bandwidth_display(&self) -> String {
        display_string(self.bandwidth_mb_per_sec)
    }
}

/// Running min/max/mean over the marks of one run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunningStats {
    min: f64,
    max: f64,
    avg: f64,
    count: u32,
}

impl RunningStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold `mark`'s bandwidth into the statistics and stamp the updated
    /// cumulative values onto the mark.
    pub fn record(&mut self, mark: &mut DiskMark) {
        let x = mark.bandwidth_mb_per_sec;
        if self.count == 0 {
            self.min = x;
            self.max = x;
        } else {
            self.min = self.min.min(x);
            self.max = self.max.max(x);
        }
        self.avg = (self.avg * self.count as f64 + x) / (self.count as f64 + 1.0);
        // rounding in the running mean can drift just past the extremes
        self.avg = self.avg.max(self.min).min(self.max);
        self.count += 1;

        mark.cumulative_min = self.min;
        mark.cumulative_max = self.max;
        mark.cumulative_avg = self.avg;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// `(min, max, avg)`, or `None` before the first mark
    pub fn summary(&self) -> Option<(f64, f64, f64)> {
        (self.count > 0).then_some((self.min, self.max, self.avg))
    }
}
