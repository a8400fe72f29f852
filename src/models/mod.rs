//! Data models module
//!
//! Marks, runs and the running statistics that connect them.

pub mod mark;
pub mod run;

// Re-export commonly used types
pub use mark::{BlockSequence, DiskMark, IoMode, RunningStats};
pub use run::DiskRun;
