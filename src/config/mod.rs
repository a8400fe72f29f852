//! Configuration management module
//!
//! Handles loading, saving, and validation of the benchmark configuration,
//! and defines the settings provider the engine talks to while it runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{BlockSequence, DiskMark};
use crate::{DiskMarkError, Result, APP_NAME, CONFIG_FILE, DATA_DIR_NAME, KILOBYTE};

pub mod persistence;

/// Benchmark configuration structure containing all test parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BenchmarkConfig {
    /// Run the read phase
    pub read_test: bool,
    /// Run the write phase
    pub write_test: bool,
    /// Marks per phase
    pub num_marks: u32,
    /// Blocks per mark
    pub num_blocks: u32,
    /// Block size in KB (1 KB = 1024 bytes)
    pub block_size_kb: u32,
    pub block_sequence: BlockSequence,
    /// One data file per mark instead of a single shared file
    pub multi_file: bool,
    /// Make every block write durable before the next one starts
    pub write_sync: bool,
    /// Reset accumulated test data before a benchmark request
    pub auto_reset: bool,
    /// Delete the data directory once a benchmark request finishes
    pub auto_remove_data: bool,
    /// Directory holding the benchmark data files
    pub data_dir: PathBuf,
    /// Mark index the next phase starts at
    pub next_mark_number: u32,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        let home = dirs::home_dir()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."));
        Self {
            read_test: false,
            write_test: true,
            num_marks: 25,
            num_blocks: 32,
            block_size_kb: 512,
            block_sequence: BlockSequence::Sequential,
            multi_file: true,
            write_sync: false,
            auto_reset: true,
            auto_remove_data: false,
            data_dir: home.join(DATA_DIR_NAME),
            next_mark_number: 0,
        }
    }
}

impl BenchmarkConfig {
    /// Create a new benchmark configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Block size in bytes
    pub fn block_size_bytes(&self) -> u64 {
        self.block_size_kb as u64 * KILOBYTE
    }

    /// Bytes one mark transfers
    pub fn mark_size_bytes(&self) -> u64 {
        self.block_size_bytes() * self.num_blocks as u64
    }

    pub fn target_tx_size_kb(&self) -> u64 {
        self.block_size_kb as u64 * self.num_blocks as u64
    }

    /// Block operations across every enabled phase
    pub fn total_units(&self) -> u64 {
        let per_phase = self.num_blocks as u64 * self.num_marks as u64;
        let phases = self.write_test as u64 + self.read_test as u64;
        per_phase * phases
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !self.read_test && !self.write_test {
            return Err(DiskMarkError::Config(
                "At least one of the read or write tests must be enabled".to_string(),
            ));
        }

        if self.num_marks == 0 {
            return Err(DiskMarkError::Config(
                "Number of marks must be greater than 0".to_string(),
            ));
        }

        if self.num_blocks == 0 {
            return Err(DiskMarkError::Config(
                "Number of blocks must be greater than 0".to_string(),
            ));
        }

        if self.block_size_kb == 0 {
            return Err(DiskMarkError::Config(
                "Block size must be greater than 0".to_string(),
            ));
        }

        const MAX_BLOCK_SIZE_KB: u32 = 1024 * 1024; // 1 GiB
        if self.block_size_kb > MAX_BLOCK_SIZE_KB {
            return Err(DiskMarkError::Config(format!(
                "Block size too large: {} KB (max: {} KB)",
                self.block_size_kb, MAX_BLOCK_SIZE_KB
            )));
        }

        if self.next_mark_number.checked_add(self.num_marks).is_none() {
            return Err(DiskMarkError::Config(format!(
                "Mark numbers overflow: starting at {} with {} marks",
                self.next_mark_number, self.num_marks
            )));
        }

        if self.data_dir.as_os_str().is_empty() {
            return Err(DiskMarkError::Config(
                "Data directory must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn with_read_test(mut self, enabled: bool) -> Self {
        self.read_test = enabled;
        self
    }

    pub fn with_write_test(mut self, enabled: bool) -> Self {
        self.write_test = enabled;
        self
    }

    pub fn with_num_marks(mut self, marks: u32) -> Self {
        self.num_marks = marks;
        self
    }

    pub fn with_num_blocks(mut self, blocks: u32) -> Self {
        self.num_blocks = blocks;
        self
    }

    pub fn with_block_size_kb(mut self, size_kb: u32) -> Self {
        self.block_size_kb = size_kb;
        self
    }

    pub fn with_block_sequence(mut self, sequence: BlockSequence) -> Self {
        self.block_sequence = sequence;
        self
    }

    pub fn with_multi_file(mut self, multi_file: bool) -> Self {
        self.multi_file = multi_file;
        self
    }

    pub fn with_write_sync(mut self, write_sync: bool) -> Self {
        self.write_sync = write_sync;
        self
    }

    pub fn with_auto_reset(mut self, auto_reset: bool) -> Self {
        self.auto_reset = auto_reset;
        self
    }

    pub fn with_auto_remove_data(mut self, auto_remove: bool) -> Self {
        self.auto_remove_data = auto_remove;
        self
    }

    /// Set the data directory for testing
    pub fn with_data_dir(mut self, path: PathBuf) -> Self {
        self.data_dir = path;
        self
    }

    pub fn with_next_mark_number(mut self, next: u32) -> Self {
        self.next_mark_number = next;
        self
    }

    /// Load configuration from the standard config file location
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| {
            DiskMarkError::Config(format!(
                "Failed to read config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| {
            DiskMarkError::Config(format!(
                "Failed to parse config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to the standard config file location
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_file_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        self.validate()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DiskMarkError::Config(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(config_path, content).map_err(|e| {
            DiskMarkError::Config(format!(
                "Failed to write config file {}: {}",
                config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the standard configuration file path
    /// Uses $CONFIG_HOME/diskmark/diskmark.toml
    pub fn config_file_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().ok_or_else(|| {
            DiskMarkError::Config("Unable to determine config directory".to_string())
        })?;

        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE))
    }
}

/// Settings provider consulted by the engine while a benchmark runs.
///
/// The configuration is read-only to the engine; the only value it writes
/// back is the next-mark cursor, once per finished phase.
pub trait BenchmarkSettings: Send {
    fn config(&self) -> &BenchmarkConfig;

    fn next_mark_number(&self) -> u32 {
        self.config().next_mark_number
    }

    fn set_next_mark_number(&mut self, next: u32);

    /// Forget accumulated test data ahead of a new request
    fn reset_test_data(&mut self);

    /// Observe a freshly recorded mark
    fn update_metrics(&mut self, mark: &DiskMark);

    /// Log sink for operator-facing messages
    fn message(&mut self, text: &str);

    fn set_idle_state(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Idle,
    Running,
}

/// Default settings provider: owns the configuration and logs messages
/// through `tracing`.
#[derive(Debug, Clone)]
pub struct AppSettings {
    config: BenchmarkConfig,
    state: AppState,
    marks_observed: u64,
}

impl AppSettings {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            state: AppState::Idle,
            marks_observed: 0,
        }
    }

    pub fn set_running(&mut self) {
        self.state = AppState::Running;
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    /// Marks reported through `update_metrics` since the last reset
    pub fn marks_observed(&self) -> u64 {
        self.marks_observed
    }

    pub fn into_config(self) -> BenchmarkConfig {
        self.config
    }
}

impl BenchmarkSettings for AppSettings {
    fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    fn set_next_mark_number(&mut self, next: u32) {
        self.config.next_mark_number = next;
    }

    fn reset_test_data(&mut self) {
        self.marks_observed = 0;
        self.config.next_mark_number = 0;
    }

    fn update_metrics(&mut self, mark: &DiskMark) {
        self.marks_observed += 1;
        debug!(
            mode = %mark.mode,
            mark = mark.mark_number,
            bw = mark.bandwidth_mb_per_sec,
            min = mark.cumulative_min,
            max = mark.cumulative_max,
            avg = mark.cumulative_avg,
            "mark recorded"
        );
    }

    fn message(&mut self, text: &str) {
        info!("{}", text);
    }

    fn set_idle_state(&mut self) {
        self.state = AppState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::IoMode;
    use tempfile::tempdir;

    #[test]
    fn test_defaults_are_valid() {
        let config = BenchmarkConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.target_tx_size_kb(), 512 * 32);
        assert!(config.data_dir.ends_with(DATA_DIR_NAME));
    }

    #[test]
    fn test_total_units_counts_enabled_phases() {
        let config = BenchmarkConfig::default()
            .with_num_marks(4)
            .with_num_blocks(8)
            .with_write_test(true)
            .with_read_test(false);
        assert_eq!(config.total_units(), 32);
        assert_eq!(config.clone().with_read_test(true).total_units(), 64);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let base = BenchmarkConfig::default();
        assert!(base.clone().with_num_marks(0).validate().is_err());
        assert!(base.clone().with_num_blocks(0).validate().is_err());
        assert!(base.clone().with_block_size_kb(0).validate().is_err());
        assert!(base
            .clone()
            .with_write_test(false)
            .with_read_test(false)
            .validate()
            .is_err());
        assert!(base
            .clone()
            .with_next_mark_number(u32::MAX)
            .validate()
            .is_err());
    }

    #[test]
    fn test_toml_round_trip_via_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join(CONFIG_FILE);
        let config = BenchmarkConfig::default()
            .with_read_test(true)
            .with_block_sequence(BlockSequence::Random)
            .with_data_dir(dir.path().join("data"))
            .with_next_mark_number(50);

        config.save_to(&path).unwrap();
        let loaded = BenchmarkConfig::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: BenchmarkConfig =
            toml::from_str("num_marks = 3\nblock_sequence = \"Random\"\n").unwrap();
        assert_eq!(config.num_marks, 3);
        assert_eq!(config.block_sequence, BlockSequence::Random);
        assert_eq!(config.num_blocks, BenchmarkConfig::default().num_blocks);
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let dir = tempdir().unwrap();
        let loaded = BenchmarkConfig::load_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(loaded, BenchmarkConfig::default());
    }

    #[test]
    fn test_config_file_path() {
        let path = BenchmarkConfig::config_file_path().unwrap();
        assert!(path.to_string_lossy().contains("diskmark.toml"));
    }

    #[test]
    fn test_app_settings_cursor_and_state() {
        let mut settings = AppSettings::new(BenchmarkConfig::default().with_next_mark_number(5));
        assert_eq!(settings.next_mark_number(), 5);

        settings.set_running();
        assert_eq!(settings.state(), AppState::Running);

        settings.set_next_mark_number(30);
        settings.update_metrics(&DiskMark::new(IoMode::Write, 29));
        assert_eq!(settings.next_mark_number(), 30);
        assert_eq!(settings.marks_observed(), 1);

        settings.reset_test_data();
        assert_eq!(settings.next_mark_number(), 0);
        assert_eq!(settings.marks_observed(), 0);

        settings.set_idle_state();
        assert_eq!(settings.state(), AppState::Idle);
    }
}
