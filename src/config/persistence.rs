//! Run persistence module
//!
//! Handles saving, loading, and rotation of completed runs.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::models::DiskRun;
use crate::{DiskMarkError, Result, APP_NAME, MAX_RUN_HISTORY, RUNS_FILE};

/// Persistence sink for completed runs.
///
/// `store_run` is all-or-nothing: either the run is durably recorded or an
/// error is returned and nothing changed.
pub trait RunStore: Send + Sync {
    fn store_run(&self, run: &DiskRun) -> Result<()>;
}

/// Runs file structure for JSON persistence
#[derive(Debug, Serialize, Deserialize)]
struct RunsFile {
    version: u32,
    runs: Vec<DiskRun>,
}

/// JSON-file backed run store
#[derive(Debug)]
pub struct JsonRunStore {
    runs_path: PathBuf,
}

impl JsonRunStore {
    /// Create a store at the standard runs file location
    pub fn new() -> Result<Self> {
        Ok(Self {
            runs_path: Self::runs_file_path()?,
        })
    }

    pub fn at(runs_path: PathBuf) -> Self {
        Self { runs_path }
    }

    /// Get the standard runs file path
    /// Uses $DATA_HOME/diskmark/runs.json
    pub fn runs_file_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().ok_or_else(|| {
            DiskMarkError::Config("Unable to determine data directory".to_string())
        })?;

        Ok(data_dir.join(APP_NAME).join(RUNS_FILE))
    }

    /// Load all runs from the runs file
    pub fn load_runs(&self) -> Result<Vec<DiskRun>> {
        if !self.runs_path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.runs_path).map_err(|e| {
            DiskMarkError::Persistence(format!(
                "Failed to read runs file {}: {}",
                self.runs_path.display(),
                e
            ))
        })?;

        let runs_file: RunsFile = serde_json::from_str(&content)?;
        Ok(runs_file.runs)
    }

    /// Append a run, keeping only the most recent MAX_RUN_HISTORY entries
    pub fn append_run(&self, run: DiskRun) -> Result<()> {
        let mut runs = self.load_runs()?;
        runs.push(run);

        if runs.len() > MAX_RUN_HISTORY {
            let skip_count = runs.len() - MAX_RUN_HISTORY;
            runs.drain(..skip_count);
        }

        self.save_runs(runs)
    }

    // Write to a sibling temp file and rename it into place.
    fn save_runs(&self, runs: Vec<DiskRun>) -> Result<()> {
        if let Some(parent) = self.runs_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                DiskMarkError::Persistence(format!(
                    "Failed to create runs directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let runs_file = RunsFile { version: 1, runs };
        let content = serde_json::to_string_pretty(&runs_file)?;

        let tmp_path = self.runs_path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .and_then(|_| fs::rename(&tmp_path, &self.runs_path))
            .map_err(|e| {
                let _ = fs::remove_file(&tmp_path);
                DiskMarkError::Persistence(format!(
                    "Failed to write runs file {}: {}",
                    self.runs_path.display(),
                    e
                ))
            })
    }

    pub fn count_runs(&self) -> Result<usize> {
        Ok(self.load_runs()?.len())
    }

    /// Clear all stored runs
    pub fn clear_runs(&self) -> Result<()> {
        if self.runs_path.exists() {
            fs::remove_file(&self.runs_path).map_err(|e| {
                DiskMarkError::Persistence(format!(
                    "Failed to remove runs file {}: {}",
                    self.runs_path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Get the most recent N runs, oldest first
    pub fn recent_runs(&self, count: usize) -> Result<Vec<DiskRun>> {
        let mut runs = self.load_runs()?;
        if runs.len() > count {
            runs.drain(..runs.len() - count);
        }
        Ok(runs)
    }

    pub fn runs_path(&self) -> &Path {
        &self.runs_path
    }
}

impl RunStore for JsonRunStore {
    fn store_run(&self, run: &DiskRun) -> Result<()> {
        self.append_run(run.clone())
    }
}

/// In-memory run store for shells that do not persist runs
#[derive(Debug, Default)]
pub struct MemoryRunStore {
    runs: Mutex<Vec<DiskRun>>,
}

impl MemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn runs(&self) -> Vec<DiskRun> {
        self.runs.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

impl RunStore for MemoryRunStore {
    fn store_run(&self, run: &DiskRun) -> Result<()> {
        let mut runs = self
            .runs
            .lock()
            .map_err(|_| DiskMarkError::Persistence("Run store lock poisoned".to_string()))?;
        runs.push(run.clone());
        Ok(())
    }
}
