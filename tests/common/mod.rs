//! Test doubles shared by the integration tests
#![allow(dead_code)]

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};

use diskmark::bench::{BenchmarkUi, PhaseContext, ProgressChannel};
use diskmark::config::persistence::RunStore;
use diskmark::config::{BenchmarkConfig, BenchmarkSettings};
use diskmark::io::{BlockFile, DiskIO, PlatformDiskIO};
use diskmark::models::{DiskMark, DiskRun, IoMode};
use diskmark::{DiskMarkError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum UiCall {
    UpdateLegend,
    ResetTestData,
    WriteMark(DiskMark),
    ReadMark(DiskMark),
    Title(String),
    AdjustSensitivity,
    Plain { text: String, title: String },
    Error { text: String, title: String },
    Run(DiskRun),
    Progress(u8),
}

/// Shared, ordered log of everything the engine told the UI
#[derive(Debug, Clone, Default)]
pub struct UiLog(Arc<Mutex<Vec<UiCall>>>);

impl UiLog {
    pub fn push(&self, call: UiCall) {
        self.0.lock().unwrap().push(call);
    }

    pub fn calls(&self) -> Vec<UiCall> {
        self.0.lock().unwrap().clone()
    }

    pub fn write_marks(&self) -> Vec<DiskMark> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::WriteMark(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn read_marks(&self) -> Vec<DiskMark> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::ReadMark(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn runs(&self) -> Vec<DiskRun> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Run(r) => Some(r),
                _ => None,
            })
            .collect()
    }

    pub fn errors(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Error { text, title } => Some((text, title)),
                _ => None,
            })
            .collect()
    }

    pub fn plain_messages(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Plain { text, title } => Some((text, title)),
                _ => None,
            })
            .collect()
    }

    pub fn progress(&self) -> Vec<u8> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                UiCall::Progress(p) => Some(p),
                _ => None,
            })
            .collect()
    }
}

/// Pure recorder of UI calls
#[derive(Debug, Clone, Default)]
pub struct RecordingUi {
    pub log: UiLog,
}

impl RecordingUi {
    pub fn new(log: UiLog) -> Self {
        Self { log }
    }
}

impl BenchmarkUi for RecordingUi {
    fn update_legend(&mut self) {
        self.log.push(UiCall::UpdateLegend);
    }

    fn reset_test_data(&mut self) {
        self.log.push(UiCall::ResetTestData);
    }

    fn add_write_mark(&mut self, mark: &DiskMark) {
        self.log.push(UiCall::WriteMark(mark.clone()));
    }

    fn add_read_mark(&mut self, mark: &DiskMark) {
        self.log.push(UiCall::ReadMark(mark.clone()));
    }

    fn update_title(&mut self, disk_info: &str) {
        self.log.push(UiCall::Title(disk_info.to_string()));
    }

    fn adjust_sensitivity(&mut self) {
        self.log.push(UiCall::AdjustSensitivity);
    }

    fn show_plain_message_dialog(&mut self, text: &str, title: &str) {
        self.log.push(UiCall::Plain {
            text: text.to_string(),
            title: title.to_string(),
        });
    }

    fn show_error_message_dialog(&mut self, text: &str, title: &str) {
        self.log.push(UiCall::Error {
            text: text.to_string(),
            title: title.to_string(),
        });
    }

    fn add_run(&mut self, run: &DiskRun) {
        self.log.push(UiCall::Run(run.clone()));
    }

    fn set_progress(&mut self, percent: u8) {
        self.log.push(UiCall::Progress(percent));
    }
}

/// Progress channel that hands published marks straight to the UI log and
/// optionally reports cancellation once `cancel_after` marks were published.
#[derive(Debug, Clone, Default)]
pub struct StubProgress {
    log: UiLog,
    cancel_after: Option<u32>,
    published: u32,
}

impl StubProgress {
    pub fn new(log: UiLog) -> Self {
        Self {
            log,
            cancel_after: None,
            published: 0,
        }
    }

    pub fn cancel_after(log: UiLog, marks: u32) -> Self {
        Self {
            log,
            cancel_after: Some(marks),
            published: 0,
        }
    }
}

impl ProgressChannel for StubProgress {
    fn publish(&mut self, mark: &DiskMark) {
        self.published += 1;
        match mark.mode {
            IoMode::Write => self.log.push(UiCall::WriteMark(mark.clone())),
            IoMode::Read => self.log.push(UiCall::ReadMark(mark.clone())),
        }
    }

    fn set_progress(&mut self, percent: u8) {
        self.log.push(UiCall::Progress(percent));
    }

    fn is_cancelled(&self) -> bool {
        matches!(self.cancel_after, Some(limit) if self.published >= limit)
    }
}

/// Settings provider that records what the engine reports to it
#[derive(Debug, Clone)]
pub struct TestSettings {
    pub config: BenchmarkConfig,
    pub messages: Vec<String>,
    pub metrics: Vec<DiskMark>,
    pub resets: u32,
    pub idle: bool,
}

impl TestSettings {
    pub fn new(config: BenchmarkConfig) -> Self {
        Self {
            config,
            messages: Vec::new(),
            metrics: Vec::new(),
            resets: 0,
            idle: false,
        }
    }
}

impl BenchmarkSettings for TestSettings {
    fn config(&self) -> &BenchmarkConfig {
        &self.config
    }

    fn set_next_mark_number(&mut self, next: u32) {
        self.config.next_mark_number = next;
    }

    fn reset_test_data(&mut self) {
        self.resets += 1;
        self.config.next_mark_number = 0;
    }

    fn update_metrics(&mut self, mark: &DiskMark) {
        self.metrics.push(mark.clone());
    }

    fn message(&mut self, text: &str) {
        self.messages.push(text.to_string());
    }

    fn set_idle_state(&mut self) {
        self.idle = true;
    }
}

/// Run store that keeps runs in memory, or refuses every store
#[derive(Debug, Default)]
pub struct RecordingStore {
    runs: Mutex<Vec<DiskRun>>,
    fail: bool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            runs: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    pub fn runs(&self) -> Vec<DiskRun> {
        self.runs.lock().unwrap().clone()
    }
}

impl RunStore for RecordingStore {
    fn store_run(&self, run: &DiskRun) -> Result<()> {
        if self.fail {
            return Err(DiskMarkError::Persistence("store unavailable".to_string()));
        }
        self.runs.lock().unwrap().push(run.clone());
        Ok(())
    }
}

/// Real disk I/O whose files start failing after `ok_blocks` block operations
#[derive(Debug, Clone, Copy)]
pub struct FailingDiskIO {
    pub ok_blocks: u32,
}

struct FailingFile {
    inner: Box<dyn BlockFile>,
    remaining: u32,
}

impl FailingFile {
    fn spend(&mut self) -> io::Result<()> {
        if self.remaining == 0 {
            return Err(io::Error::new(io::ErrorKind::Other, "injected block failure"));
        }
        self.remaining -= 1;
        Ok(())
    }
}

impl BlockFile for FailingFile {
    fn write_block_at(&mut self, offset: u64, buf: &[u8]) -> io::Result<()> {
        self.spend()?;
        self.inner.write_block_at(offset, buf)
    }

    fn read_block_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.spend()?;
        self.inner.read_block_at(offset, buf)
    }
}

impl DiskIO for FailingDiskIO {
    fn open_for_write(&self, path: &Path, write_sync: bool) -> io::Result<Box<dyn BlockFile>> {
        Ok(Box::new(FailingFile {
            inner: PlatformDiskIO::new().open_for_write(path, write_sync)?,
            remaining: self.ok_blocks,
        }))
    }

    fn open_for_read(&self, path: &Path) -> io::Result<Box<dyn BlockFile>> {
        Ok(Box::new(FailingFile {
            inner: PlatformDiskIO::new().open_for_read(path)?,
            remaining: self.ok_blocks,
        }))
    }

    fn disk_info(&self, _dir: &Path) -> String {
        "faulty-disk".to_string()
    }
}

/// Everything one engine invocation needs, owned in one place
pub struct Harness {
    pub settings: TestSettings,
    pub log: UiLog,
    pub ui: RecordingUi,
    pub progress: StubProgress,
    pub store: RecordingStore,
}

impl Harness {
    pub fn new(config: BenchmarkConfig) -> Self {
        let log = UiLog::default();
        Self {
            settings: TestSettings::new(config),
            ui: RecordingUi::new(log.clone()),
            progress: StubProgress::new(log.clone()),
            store: RecordingStore::new(),
            log,
        }
    }

    /// Report cancellation once `marks` marks have been published
    pub fn cancel_after(mut self, marks: u32) -> Self {
        self.progress = StubProgress::cancel_after(self.log.clone(), marks);
        self
    }

    pub fn with_store(mut self, store: RecordingStore) -> Self {
        self.store = store;
        self
    }

    pub fn context<'a>(&'a mut self, disk_io: &'a dyn DiskIO) -> PhaseContext<'a> {
        PhaseContext::new(
            &mut self.settings,
            &mut self.ui,
            &mut self.progress,
            &self.store,
            disk_io,
        )
    }
}

/// Small configuration rooted in `dir`, write phase only
pub fn small_config(dir: &Path, marks: u32, blocks: u32, block_kb: u32) -> BenchmarkConfig {
    BenchmarkConfig::default()
        .with_data_dir(dir.to_path_buf())
        .with_num_marks(marks)
        .with_num_blocks(blocks)
        .with_block_size_kb(block_kb)
        .with_write_test(true)
        .with_read_test(false)
        .with_auto_reset(false)
}
