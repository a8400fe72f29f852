//! Command orchestration
//!
//! Requested phases become [`BenchmarkCommand`]s queued on an [`Invoker`],
//! which runs them one after another on the calling thread.

use std::collections::VecDeque;

use tracing::{debug, error, info};

use crate::bench::phase::{PhaseContext, PhaseExecutor, PhaseOutcome};
use crate::models::IoMode;
use crate::{DiskMarkError, Result};

pub const CACHE_ADVISORY_TITLE: &str = "Clear Disk Cache Now";
pub const CACHE_ADVISORY_MESSAGE: &str = "For valid READ measurements please clear the disk cache by\n\
using the included RAMMap.exe or flushmem.exe utilities.\n\
Removable drives can be disconnected and reconnected.\n\
For system drives use the WRITE and READ operations \n\
independantly by doing a cold reboot after the WRITE";

/// One queued phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BenchmarkCommand {
    executor: PhaseExecutor,
    start_mark: Option<u32>,
}

impl BenchmarkCommand {
    pub fn new(executor: PhaseExecutor) -> Self {
        Self {
            executor,
            start_mark: None,
        }
    }

    /// Number marks from `start_mark` instead of the cursor current at execution
    pub fn starting_at(mut self, start_mark: u32) -> Self {
        self.start_mark = Some(start_mark);
        self
    }

    pub fn write() -> Self {
        Self::new(PhaseExecutor::Write)
    }

    pub fn read() -> Self {
        Self::new(PhaseExecutor::Read)
    }

    pub fn executor(&self) -> PhaseExecutor {
        self.executor
    }

    /// Run the phase, then store the cursor it returns
    pub fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<PhaseOutcome> {
        let outcome = match self.start_mark {
            Some(start_mark) => self.executor.execute_from(ctx, start_mark)?,
            None => self.executor.execute(ctx)?,
        };
        ctx.settings.set_next_mark_number(outcome.next_mark_number);
        debug!(
            mode = %outcome.mode,
            from = outcome.start_mark,
            to = outcome.next_mark_number,
            "mark cursor advanced"
        );
        Ok(outcome)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvokerState {
    Idle,
    Queued,
    Running,
    Done,
}

/// FIFO queue of commands, run serially. Single use: once `Done` it
/// accepts no further work.
#[derive(Debug)]
pub struct Invoker {
    queue: VecDeque<BenchmarkCommand>,
    state: InvokerState,
}

impl Default for Invoker {
    fn default() -> Self {
        Self::new()
    }
}

impl Invoker {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            state: InvokerState::Idle,
        }
    }

    pub fn state(&self) -> InvokerState {
        self.state
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn submit(&mut self, command: BenchmarkCommand) -> Result<()> {
        match self.state {
            InvokerState::Idle | InvokerState::Queued => {
                self.queue.push_back(command);
                self.state = InvokerState::Queued;
                Ok(())
            }
            state => Err(DiskMarkError::Benchmark(format!(
                "Cannot submit a command to an invoker in state {:?}",
                state
            ))),
        }
    }

    /// Run every queued command in order.
    ///
    /// The first error drops the rest of the queue and is returned. After a
    /// write phase that finished uncancelled, the cache advisory is shown
    /// before a following read phase starts.
    pub fn run_all(&mut self, ctx: &mut PhaseContext<'_>) -> Result<Vec<PhaseOutcome>> {
        if self.state == InvokerState::Done {
            return Err(DiskMarkError::Benchmark(
                "Invoker has already run".to_string(),
            ));
        }

        let mut outcomes: Vec<PhaseOutcome> = Vec::with_capacity(self.queue.len());
        while let Some(command) = self.queue.pop_front() {
            self.state = InvokerState::Running;

            if command.executor() == PhaseExecutor::Read
                && needs_cache_advisory(outcomes.last())
                && !ctx.progress.is_cancelled()
            {
                ctx.ui
                    .show_plain_message_dialog(CACHE_ADVISORY_MESSAGE, CACHE_ADVISORY_TITLE);
            }

            info!(mode = %command.executor().mode(), "starting phase");
            match command.execute(ctx) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => {
                    error!(
                        mode = %command.executor().mode(),
                        dropped = self.queue.len(),
                        error = %e,
                        "phase failed, aborting remaining commands"
                    );
                    self.queue.clear();
                    self.state = InvokerState::Done;
                    return Err(e);
                }
            }
        }

        self.state = InvokerState::Done;
        Ok(outcomes)
    }
}

fn needs_cache_advisory(previous: Option<&PhaseOutcome>) -> bool {
    matches!(previous, Some(outcome) if outcome.mode == IoMode::Write && !outcome.cancelled)
}
