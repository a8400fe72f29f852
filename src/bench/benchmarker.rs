use tracing::info;

use crate::bench::command::{BenchmarkCommand, Invoker};
use crate::bench::phase::{PhaseContext, PhaseOutcome};
use crate::Result;

/// Turns one benchmark request into queued phases and runs them.
///
/// Write is queued before read; each is queued only if enabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct Benchmarker;

impl Benchmarker {
    pub fn new() -> Self {
        Self
    }

    pub fn run_benchmark(&self, ctx: &mut PhaseContext<'_>) -> Result<Vec<PhaseOutcome>> {
        let config = ctx.settings.config().clone();
        config.validate()?;

        ctx.settings.message(&format!(
            "Running readTest {}   writeTest {}",
            config.read_test, config.write_test
        ));
        ctx.settings.message(&format!(
            "num files: {}, num blks: {}, blk size (kb): {}, blockSequence: {}",
            config.num_marks, config.num_blocks, config.block_size_kb, config.block_sequence
        ));

        ctx.ui.update_legend();

        if config.auto_reset {
            ctx.settings.reset_test_data();
            ctx.ui.reset_test_data();
        }

        // Both phases cover the same marks so a read finds the files just written
        let start_mark = ctx.settings.next_mark_number();
        let mut invoker = Invoker::new();
        if config.write_test {
            invoker.submit(BenchmarkCommand::write().starting_at(start_mark))?;
        }
        if config.read_test {
            invoker.submit(BenchmarkCommand::read().starting_at(start_mark))?;
        }

        let outcomes = invoker.run_all(ctx)?;
        info!(
            phases = outcomes.len(),
            next_mark = ctx.settings.next_mark_number(),
            "benchmark finished"
        );
        Ok(outcomes)
    }
}
