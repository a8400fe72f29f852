//! diskmark - mark-based disk I/O benchmark engine
//!
//! Writes and reads fixed-size blocks in timed "marks", folds every mark
//! into a per-run summary and streams progress to whatever front end
//! hosts the worker.

use std::fmt;

pub mod bench;
pub mod config;
pub mod console;
pub mod io;
pub mod models;
pub mod util;

// Common error types
#[derive(Debug)]
pub enum DiskMarkError {
    /// I/O operation failed
    Io(std::io::Error),
    /// Configuration validation or parsing error
    Config(String),
    /// Benchmark execution error
    Benchmark(String),
    /// Read phase found no data written by an earlier write phase
    MissingTestData(String),
    /// Run persistence error
    Persistence(String),
    /// Worker hosting error
    Worker(String),
}

impl fmt::Display for DiskMarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiskMarkError::Io(err) => write!(f, "I/O error: {}", err),
            DiskMarkError::Config(msg) => write!(f, "Configuration error: {}", msg),
            DiskMarkError::Benchmark(msg) => write!(f, "Benchmark error: {}", msg),
            DiskMarkError::MissingTestData(msg) => write!(f, "No test data: {}", msg),
            DiskMarkError::Persistence(msg) => write!(f, "Run persistence error: {}", msg),
            DiskMarkError::Worker(msg) => write!(f, "Worker error: {}", msg),
        }
    }
}

impl std::error::Error for DiskMarkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DiskMarkError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for DiskMarkError {
    fn from(err: std::io::Error) -> Self {
        DiskMarkError::Io(err)
    }
}

impl From<serde_json::Error> for DiskMarkError {
    fn from(err: serde_json::Error) -> Self {
        DiskMarkError::Persistence(format!("JSON serialization error: {}", err))
    }
}

impl From<toml::de::Error> for DiskMarkError {
    fn from(err: toml::de::Error) -> Self {
        DiskMarkError::Config(format!("TOML parsing error: {}", err))
    }
}

impl From<toml::ser::Error> for DiskMarkError {
    fn from(err: toml::ser::Error) -> Self {
        DiskMarkError::Config(format!("TOML serialization error: {}", err))
    }
}

/// Result type alias for diskmark operations
pub type Result<T> = std::result::Result<T, DiskMarkError>;

/// Error handling utilities
pub mod error {
    use super::DiskMarkError;

    /// Convert error to user-friendly message with suggestions
    pub fn user_friendly_message(error: &DiskMarkError) -> String {
        match error {
            DiskMarkError::Io(err) if err.kind() == std::io::ErrorKind::PermissionDenied => {
                "Permission denied. Choose a data directory you can write to.".to_string()
            }
            DiskMarkError::MissingTestData(_) => {
                "No benchmark data to read. Run a write benchmark first.".to_string()
            }
            DiskMarkError::Config(msg) => {
                format!("Configuration error: {}. Check your settings.", msg)
            }
            DiskMarkError::Persistence(_) => {
                "Failed to save the run. Check disk space and permissions.".to_string()
            }
            _ => error.to_string(),
        }
    }
}

// Common types and constants
pub const APP_NAME: &str = "diskmark";
pub const CONFIG_FILE: &str = "diskmark.toml";
pub const RUNS_FILE: &str = "runs.json";
pub const DATA_DIR_NAME: &str = "diskmark-data";
pub const MAX_RUN_HISTORY: usize = 100;

/// Base name and extension of benchmark data files: `testdata.jdm` in
/// single-file mode, `testdata<mark>.jdm` in multi-file mode.
pub const TEST_FILE_BASE: &str = "testdata";
pub const TEST_FILE_EXT: &str = "jdm";

pub const KILOBYTE: u64 = 1024;
pub const MEGABYTE: u64 = 1024 * 1024;
