//! Benchmark engine module
//!
//! Phase executors with their mark loops, the command queue that runs them,
//! and the worker that hosts a request off the async threads.

pub mod benchmarker;
pub mod command;
pub mod phase;
pub mod progress;
pub mod ui;
pub mod worker;

// Re-export commonly used types
pub use benchmarker::Benchmarker;
pub use command::{BenchmarkCommand, Invoker, InvokerState};
pub use phase::{PhaseContext, PhaseExecutor, PhaseOutcome, PhaseSnapshot};
pub use progress::{CancelToken, ProgressChannel, ProgressTracker};
pub use ui::{pump_events, BenchEvent, BenchmarkUi, ChannelProgress, ChannelUi, EventSender};
pub use worker::{DiskWorker, WorkerOutcome};
