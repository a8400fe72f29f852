//! Utility functions module
//!
//! Contains helpers for unit formatting, throughput math and data
//! directory cleanup.

pub mod files;
pub mod units;

// Re-export commonly used functions
pub use files::delete_directory;
pub use units::{calculate_throughput_mbps, display_string, format_bytes, format_throughput};
