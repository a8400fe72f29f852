//! Run data model
//!
//! A run aggregates every mark of one read phase or one write phase.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::BenchmarkConfig;
use crate::models::mark::{BlockSequence, DiskMark, IoMode};
use crate::util::units::display_string;

const UNDEFINED_STAT: &str = "- -";

/// Aggregate of one read-phase or write-phase execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskRun {
    pub mode: IoMode,
    pub block_sequence: BlockSequence,
    pub num_marks: u32,
    pub num_blocks: u32,
    pub block_size_kb: u32,
    /// Informational: `block_size_kb * num_blocks`
    pub target_tx_size_kb: u64,
    pub disk_info: String,
    pub start_time: DateTime<Utc>,
    /// Time the latest mark completed; `None` until the first mark
    pub end_time: Option<DateTime<Utc>>,
    pub run_min: Option<f64>,
    pub run_max: Option<f64>,
    pub run_avg: Option<f64>,
    /// Marks folded into this run so far
    pub marks_recorded: u32,
}

impl DiskRun {
    pub fn new(mode: IoMode, block_sequence: BlockSequence) -> Self {
        Self {
            mode,
            block_sequence,
            num_marks: 0,
            num_blocks: 0,
            block_size_kb: 0,
            target_tx_size_kb: 0,
            disk_info: String::new(),
            start_time: Utc::now(),
            end_time: None,
            run_min: None,
            run_max: None,
            run_avg: None,
            marks_recorded: 0,
        }
    }

    /// Create a run carrying a copy of the configuration it measures.
    pub fn from_config(mode: IoMode, config: &BenchmarkConfig, disk_info: String) -> Self {
        Self {
            num_marks: config.num_marks,
            num_blocks: config.num_blocks,
            block_size_kb: config.block_size_kb,
            target_tx_size_kb: config.target_tx_size_kb(),
            disk_info,
            ..Self::new(mode, config.block_sequence)
        }
    }

    /// Copy the cumulative statistics stamped on `mark` into the run and
    /// move the end time to now.
    pub fn record_mark(&mut self, mark: &DiskMark) {
        self.run_min = Some(mark.cumulative_min);
        self.run_max = Some(mark.cumulative_max);
        self.run_avg = Some(mark.cumulative_avg);
        self.marks_recorded += 1;
        self.end_time = Some(Utc::now());
    }

    pub fn set_end_time(&mut self, end_time: DateTime<Utc>) {
        self.end_time = Some(end_time);
    }

    /// Elapsed time between start and the latest recorded mark
    pub fn duration(&self) -> Option<Duration> {
        self.end_time
            .map(|end| (end - self.start_time).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whole-second duration such as `"3s"`, or `"unknown"` before any mark
    pub fn duration_display(&self) -> String {
        match self.duration() {
            Some(d) => humantime::format_duration(Duration::from_secs(d.as_secs())).to_string(),
            None => "unknown".to_string(),
        }
    }

    pub fn min_display(&self) -> String {
        stat_display(self.run_min)
    }

    pub fn max_display(&self) -> String {
        stat_display(self.run_max)
    }

    pub fn avg_display(&self) -> String {
        stat_display(self.run_avg)
    }

    pub fn summary(&self) -> String {
        format!(
            "{} {} - {} marks x {} blks x {} KB - min {} / max {} / avg {} MB/s - {}",
            self.mode,
            self.block_sequence,
            self.marks_recorded,
            self.num_blocks,
            self.block_size_kb,
            self.min_display(),
            self.max_display(),
            self.avg_display(),
            self.duration_display(),
        )
    }
}

// Negative values are the legacy "not measured" sentinel.
fn stat_display(value: Option<f64>) -> String {
    match value {
        Some(v) if v >= 0.0 => display_string(v),
        _ => UNDEFINED_STAT.to_string(),
    }
}
