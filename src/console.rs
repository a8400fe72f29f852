use std::io::{self, BufRead, Write};
use std::sync::Arc;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::bench::{pump_events, BenchmarkUi, DiskWorker, WorkerOutcome};
use crate::config::persistence::RunStore;
use crate::config::{AppSettings, BenchmarkConfig};
use crate::io::PlatformDiskIO;
use crate::models::{BlockSequence, DiskMark, DiskRun};
use crate::error::user_friendly_message;
use crate::{DiskMarkError, Result};

/// Prompt on stdin/stdout for configuration overrides.
pub fn ask_config(config: BenchmarkConfig) -> Result<BenchmarkConfig> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    ask_config_from(config, &mut input, &mut output)
}

/// Prompt for overrides on arbitrary streams. Empty or unparsable answers
/// keep the current value.
pub fn ask_config_from<R: BufRead, W: Write>(
    mut config: BenchmarkConfig,
    input: &mut R,
    output: &mut W,
) -> Result<BenchmarkConfig> {
    if let Some(v) = prompt(input, output, "Number of marks", config.num_marks)? {
        config.num_marks = v;
    }
    if let Some(v) = prompt(input, output, "Blocks per mark", config.num_blocks)? {
        config.num_blocks = v;
    }
    if let Some(v) = prompt(input, output, "Block size in KB", config.block_size_kb)? {
        config.block_size_kb = v;
    }

    let phases = match (config.write_test, config.read_test) {
        (true, true) => "wr",
        (false, true) => "r",
        _ => "w",
    };
    if let Some(answer) = prompt::<_, _, String>(input, output, "Phases (w, r, wr)", phases.to_string())? {
        let answer = answer.to_ascii_lowercase();
        if !answer.is_empty() && answer.chars().all(|c| c == 'w' || c == 'r') {
            config.write_test = answer.contains('w');
            config.read_test = answer.contains('r');
        }
    }

    let sequence = match config.block_sequence {
        BlockSequence::Sequential => "s",
        BlockSequence::Random => "r",
    };
    if let Some(answer) = prompt::<_, _, String>(
        input,
        output,
        "Block sequence (s = sequential, r = random)",
        sequence.to_string(),
    )? {
        match answer.to_ascii_lowercase().as_str() {
            "s" | "sequential" => config.block_sequence = BlockSequence::Sequential,
            "r" | "random" => config.block_sequence = BlockSequence::Random,
            _ => {}
        }
    }

    Ok(config)
}

fn prompt<R, W, T>(input: &mut R, output: &mut W, label: &str, current: T) -> Result<Option<T>>
where
    R: BufRead,
    W: Write,
    T: std::str::FromStr + std::fmt::Display,
{
    write!(output, "{} (default {}): ", label, current)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(trimmed.parse::<T>().ok())
}

/// Terminal front end: an overall progress bar plus one line per mark
pub struct ConsoleUi {
    bar: ProgressBar,
    runs: Vec<DiskRun>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template("{spinner} [{bar:40}] {pos:>3}% {msg}")
            .map(|s| s.progress_chars("=> "))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        Self::with_bar(bar)
    }

    pub fn with_bar(bar: ProgressBar) -> Self {
        Self {
            bar,
            runs: Vec::new(),
        }
    }

    pub fn runs(&self) -> &[DiskRun] {
        &self.runs
    }

    pub fn percent(&self) -> u64 {
        self.bar.position()
    }

    fn mark_line(mark: &DiskMark) -> String {
        format!(
            "{} mark {:>4}: {:>12}   (min {} / max {} / avg {})",
            mark.mode,
            mark.mark_number,
            crate::util::format_throughput(mark.bandwidth_mb_per_sec),
            crate::util::display_string(mark.cumulative_min),
            crate::util::display_string(mark.cumulative_max),
            crate::util::display_string(mark.cumulative_avg),
        )
    }
}

impl Default for ConsoleUi {
    fn default() -> Self {
        Self::new()
    }
}

impl BenchmarkUi for ConsoleUi {
    fn update_legend(&mut self) {
        self.bar.set_message("starting");
    }

    fn reset_test_data(&mut self) {
        self.runs.clear();
        self.bar.set_position(0);
    }

    fn add_write_mark(&mut self, mark: &DiskMark) {
        self.bar.println(Self::mark_line(mark));
    }

    fn add_read_mark(&mut self, mark: &DiskMark) {
        self.bar.println(Self::mark_line(mark));
    }

    fn update_title(&mut self, disk_info: &str) {
        self.bar.set_message(disk_info.to_string());
    }

    fn adjust_sensitivity(&mut self) {
        self.bar.finish_with_message("done");
    }

    fn show_plain_message_dialog(&mut self, text: &str, title: &str) {
        self.bar.println(format!("== {} ==\n{}", title, text));
    }

    fn show_error_message_dialog(&mut self, text: &str, title: &str) {
        self.bar.println(format!("!! {} !!\n{}", title, text));
    }

    fn add_run(&mut self, run: &DiskRun) {
        self.bar.println(run.summary());
        self.runs.push(run.clone());
    }

    fn set_progress(&mut self, percent: u8) {
        self.bar.set_position(percent as u64);
    }
}

/// Closing line printed after a request. Run summaries are not repeated
/// here since `ConsoleUi` prints each one as it arrives.
pub fn completion_report(runs: &[DiskRun], failure: Option<&DiskMarkError>) -> String {
    let mut report = format!("{} run(s) recorded", runs.len());
    if let Some(e) = failure {
        report.push_str(&format!("\nBenchmark did not complete: {}", user_friendly_message(e)));
    }
    report
}

/// Run one request on a worker, draining its events into `ui`. Ctrl-C
/// requests cancellation before the next mark.
pub async fn run_benchmark(
    config: BenchmarkConfig,
    store: Arc<dyn RunStore>,
    ui: &mut ConsoleUi,
) -> Result<WorkerOutcome<AppSettings>> {
    let mut settings = AppSettings::new(config);
    settings.set_running();

    let (worker, events) = DiskWorker::start(settings, store, Arc::new(PlatformDiskIO::new()));

    let cancel = worker.cancel_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current mark");
            cancel.cancel();
        }
    });

    let handled = pump_events(events, ui).await;
    interrupt.abort();

    let outcome = worker.wait().await?;
    info!(events = handled, success = outcome.success, "worker finished");
    Ok(outcome)
}
