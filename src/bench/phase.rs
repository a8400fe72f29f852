//! Write and read phase executors
//!
//! A phase runs the mark loop for one I/O mode: per mark it opens the target
//! file, moves every block through the shared buffer at the offsets chosen by
//! [`BlockPlacement`], times the whole block loop, and folds the resulting
//! bandwidth into the run statistics.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use tracing::{error, info, warn};

use crate::bench::progress::{ProgressChannel, ProgressTracker};
use crate::bench::ui::BenchmarkUi;
use crate::config::persistence::RunStore;
use crate::config::BenchmarkSettings;
use crate::io::{test_file_path, BlockBuffer, BlockPlacement, DiskIO};
use crate::models::{BlockSequence, DiskMark, DiskRun, IoMode, RunningStats};
use crate::{DiskMarkError, Result};

pub const MISSING_DATA_MESSAGE: &str =
    "May not have done Write Benchmarks, so no data available to read.";
pub const MISSING_DATA_TITLE: &str = "Unable to READ";

/// Collaborators shared by every phase of one benchmark request
pub struct PhaseContext<'a> {
    pub settings: &'a mut dyn BenchmarkSettings,
    pub ui: &'a mut dyn BenchmarkUi,
    pub progress: &'a mut dyn ProgressChannel,
    pub store: &'a dyn RunStore,
    pub disk_io: &'a dyn DiskIO,
    pub tracker: ProgressTracker,
}

impl<'a> PhaseContext<'a> {
    pub fn new(
        settings: &'a mut dyn BenchmarkSettings,
        ui: &'a mut dyn BenchmarkUi,
        progress: &'a mut dyn ProgressChannel,
        store: &'a dyn RunStore,
        disk_io: &'a dyn DiskIO,
    ) -> Self {
        let tracker = ProgressTracker::for_config(settings.config());
        Self {
            settings,
            ui,
            progress,
            store,
            disk_io,
            tracker,
        }
    }

    fn block_done(&mut self) {
        let percent = self.tracker.advance();
        self.progress.set_progress(percent);
    }
}

/// Configuration captured once at phase start
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseSnapshot {
    pub start_mark: u32,
    pub num_marks: u32,
    pub num_blocks: u32,
    pub block_size: u64,
    pub block_sequence: BlockSequence,
    pub multi_file: bool,
    pub write_sync: bool,
    pub data_dir: PathBuf,
}

impl PhaseSnapshot {
    pub fn capture(settings: &dyn BenchmarkSettings) -> Self {
        let config = settings.config();
        Self {
            start_mark: settings.next_mark_number(),
            num_marks: config.num_marks,
            num_blocks: config.num_blocks,
            block_size: config.block_size_bytes(),
            block_sequence: config.block_sequence,
            multi_file: config.multi_file,
            write_sync: config.write_sync,
            data_dir: config.data_dir.clone(),
        }
    }

    pub fn end_mark(&self) -> u32 {
        self.start_mark.saturating_add(self.num_marks)
    }

    pub fn file_for(&self, mark_number: u32) -> PathBuf {
        test_file_path(&self.data_dir, self.multi_file, mark_number)
    }
}

/// Result of one phase
#[derive(Debug, Clone, PartialEq)]
pub struct PhaseOutcome {
    pub mode: IoMode,
    pub start_mark: u32,
    /// Cursor value to store once the phase has exited
    pub next_mark_number: u32,
    pub marks_recorded: u32,
    pub cancelled: bool,
    /// Read phase stopped because its data file does not exist
    pub aborted: bool,
    /// Data file the read phase could not find
    pub missing_file: Option<PathBuf>,
    pub run: DiskRun,
}

impl PhaseOutcome {
    pub fn completed(&self) -> bool {
        !self.cancelled && !self.aborted
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseExecutor {
    Write,
    Read,
}

impl PhaseExecutor {
    pub fn mode(&self) -> IoMode {
        match self {
            PhaseExecutor::Write => IoMode::Write,
            PhaseExecutor::Read => IoMode::Read,
        }
    }

    /// Run every mark of this phase, starting at the settings' cursor.
    ///
    /// Block failures are logged and shorten the affected mark. Only a data
    /// directory that cannot be created is returned as an error.
    pub fn execute(&self, ctx: &mut PhaseContext<'_>) -> Result<PhaseOutcome> {
        let start_mark = ctx.settings.next_mark_number();
        self.execute_from(ctx, start_mark)
    }

    /// Run every mark of this phase, numbering marks from `start_mark`
    pub fn execute_from(&self, ctx: &mut PhaseContext<'_>, start_mark: u32) -> Result<PhaseOutcome> {
        let mode = self.mode();
        let mut snapshot = PhaseSnapshot::capture(&*ctx.settings);
        snapshot.start_mark = start_mark;

        if mode == IoMode::Write {
            fs::create_dir_all(&snapshot.data_dir).map_err(|e| {
                DiskMarkError::Benchmark(format!(
                    "Failed to create data directory {}: {}",
                    snapshot.data_dir.display(),
                    e
                ))
            })?;
        }

        let disk_info = ctx.disk_io.disk_info(&snapshot.data_dir);
        ctx.settings.message(&format!("disk info: ({})", disk_info));
        ctx.ui.update_title(&disk_info);

        let mut run = DiskRun::from_config(mode, ctx.settings.config(), disk_info);
        let mut buffer = BlockBuffer::new(snapshot.block_size as usize);
        let mut placement =
            BlockPlacement::new(snapshot.block_sequence, snapshot.num_blocks, snapshot.block_size);
        let mut stats = RunningStats::new();
        let mut cancelled = false;
        let mut missing = None;

        for mark_number in snapshot.start_mark..snapshot.end_mark() {
            if ctx.progress.is_cancelled() {
                info!(mode = %mode, mark = mark_number, "cancelled before mark");
                cancelled = true;
                break;
            }

            let path = snapshot.file_for(mark_number);
            let mut mark = DiskMark::new(mode, mark_number);
            let started = Instant::now();

            let bytes = match self {
                PhaseExecutor::Write => {
                    write_mark(ctx, &snapshot, &path, &buffer, &mut placement, mark_number)
                }
                PhaseExecutor::Read => {
                    match read_mark(ctx, &snapshot, &path, &mut buffer, &mut placement, mark_number) {
                        Ok(bytes) => bytes,
                        Err(err) => {
                            missing = Some((path, err));
                            break;
                        }
                    }
                }
            };

            mark.complete(bytes, started.elapsed());
            stats.record(&mut mark);

            let verb = match mode {
                IoMode::Write => "written",
                IoMode::Read => "read",
            };
            ctx.settings.message(&format!(
                "m:{} {} IO is {} MB/s    ({}MB {} in {} sec)",
                mark_number,
                mode,
                mark.bandwidth_display(),
                mark.megabytes(),
                verb,
                mark.elapsed.as_secs_f64()
            ));
            ctx.settings.update_metrics(&mark);
            ctx.progress.publish(&mark);
            run.record_mark(&mark);
        }

        let aborted = missing.is_some();
        let missing_file = missing.as_ref().map(|(path, _)| path.clone());
        if let Some((path, err)) = missing {
            let text = format!("{} {} ({})", MISSING_DATA_MESSAGE, path.display(), err);
            error!(path = %path.display(), error = %err, "no data to read");
            ctx.ui.show_error_message_dialog(&text, MISSING_DATA_TITLE);
            ctx.settings.message(&text);
        }

        if !aborted || run.marks_recorded > 0 {
            finish_run(ctx, &run);
        }

        // A phase that stopped without recording a mark leaves the cursor where
        // it was; a cancel after some marks still consumes the whole range.
        let untouched = aborted || (cancelled && run.marks_recorded == 0);
        let next_mark_number = if untouched {
            ctx.settings.next_mark_number()
        } else {
            snapshot.end_mark()
        };

        Ok(PhaseOutcome {
            mode,
            start_mark: snapshot.start_mark,
            next_mark_number,
            marks_recorded: run.marks_recorded,
            cancelled,
            aborted,
            missing_file,
            run,
        })
    }
}

fn write_mark(
    ctx: &mut PhaseContext<'_>,
    snapshot: &PhaseSnapshot,
    path: &Path,
    buffer: &BlockBuffer,
    placement: &mut BlockPlacement,
    mark_number: u32,
) -> u64 {
    let mut file = match ctx.disk_io.open_for_write(path, snapshot.write_sync) {
        Ok(file) => file,
        Err(e) => {
            error!(mark = mark_number, path = %path.display(), error = %e, "failed to open test file");
            return 0;
        }
    };

    let mut bytes = 0;
    for block in 0..snapshot.num_blocks {
        let offset = placement.offset(block);
        if let Err(e) = file.write_block_at(offset, buffer.as_slice()) {
            error!(mark = mark_number, block, offset, error = %e, "block write failed");
            break;
        }
        bytes += buffer.len() as u64;
        ctx.block_done();
    }
    bytes
}

/// Bytes read for one mark. `Err` only when the data file does not exist.
fn read_mark(
    ctx: &mut PhaseContext<'_>,
    snapshot: &PhaseSnapshot,
    path: &Path,
    buffer: &mut BlockBuffer,
    placement: &mut BlockPlacement,
    mark_number: u32,
) -> io::Result<u64> {
    let mut file = match ctx.disk_io.open_for_read(path) {
        Ok(file) => file,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Err(e),
        Err(e) => {
            error!(mark = mark_number, path = %path.display(), error = %e, "failed to open test file");
            return Ok(0);
        }
    };

    let mut bytes = 0;
    for block in 0..snapshot.num_blocks {
        let offset = placement.offset(block);
        if let Err(e) = file.read_block_at(offset, buffer.as_mut_slice()) {
            error!(mark = mark_number, block, offset, error = %e, "block read failed");
            break;
        }
        bytes += buffer.len() as u64;
        ctx.block_done();
    }
    Ok(bytes)
}

// Persistence is best effort; the run is shown either way.
fn finish_run(ctx: &mut PhaseContext<'_>, run: &DiskRun) {
    if let Err(e) = ctx.store.store_run(run) {
        warn!(mode = %run.mode, error = %e, "failed to persist run");
    }
    ctx.ui.add_run(run);
}
