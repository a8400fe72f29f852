//! Benchmark worker
//!
//! Hosts one benchmark request on a dedicated blocking thread so long I/O
//! never stalls the async side. Everything the request reports travels over
//! a bounded channel of [`BenchEvent`]s; cancellation goes the other way
//! through a [`CancelToken`].

use std::sync::Arc;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::bench::benchmarker::Benchmarker;
use crate::bench::phase::PhaseContext;
use crate::bench::progress::CancelToken;
use crate::bench::ui::{BenchEvent, BenchmarkUi, ChannelProgress, ChannelUi, EventSender, EVENT_CHANNEL_CAPACITY};
use crate::config::persistence::RunStore;
use crate::config::BenchmarkSettings;
use crate::io::DiskIO;
use crate::util::delete_directory;
use crate::{DiskMarkError, Result};

/// Final state of a worker
#[derive(Debug)]
pub struct WorkerOutcome<S> {
    /// Every requested phase ran to the end without an error or missing data
    pub success: bool,
    /// Why the request did not succeed
    pub failure: Option<DiskMarkError>,
    /// Settings as the request left them, cursor included
    pub settings: S,
}

/// Handle to a running benchmark request
#[derive(Debug)]
pub struct DiskWorker<S> {
    cancel: CancelToken,
    handle: JoinHandle<WorkerOutcome<S>>,
}

impl<S> DiskWorker<S>
where
    S: BenchmarkSettings + 'static,
{
    /// Spawn the request. Must be called from within a tokio runtime.
    pub fn start(
        settings: S,
        store: Arc<dyn RunStore>,
        disk_io: Arc<dyn DiskIO>,
    ) -> (Self, mpsc::Receiver<BenchEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let events = EventSender::new(tx, Handle::current());
        let cancel = CancelToken::new();
        let token = cancel.clone();

        let handle = tokio::task::spawn_blocking(move || {
            run_request(settings, events, token, store.as_ref(), disk_io.as_ref())
        });

        (Self { cancel, handle }, rx)
    }

    /// Ask the worker to stop before its next mark
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    pub async fn wait(self) -> Result<WorkerOutcome<S>> {
        self.handle
            .await
            .map_err(|e| DiskMarkError::Worker(format!("Worker join failed: {}", e)))
    }
}

fn run_request<S: BenchmarkSettings>(
    mut settings: S,
    events: EventSender,
    cancel: CancelToken,
    store: &dyn RunStore,
    disk_io: &dyn DiskIO,
) -> WorkerOutcome<S> {
    info!("*** New worker thread started ***");

    let mut ui = ChannelUi::new(events.clone());
    let mut progress = ChannelProgress::new(events, cancel);

    let failure = {
        let mut ctx = PhaseContext::new(&mut settings, &mut ui, &mut progress, store, disk_io);
        match Benchmarker::new().run_benchmark(&mut ctx) {
            Ok(outcomes) => outcomes
                .into_iter()
                .find_map(|o| o.missing_file)
                .map(|path| DiskMarkError::MissingTestData(path.display().to_string())),
            Err(e) => {
                error!(error = %e, "benchmark failed");
                Some(e)
            }
        }
    };

    if settings.config().auto_remove_data {
        let data_dir = settings.config().data_dir.clone();
        match delete_directory(&data_dir) {
            Ok(true) => info!(path = %data_dir.display(), "removed benchmark data"),
            Ok(false) => {}
            Err(e) => warn!(path = %data_dir.display(), error = %e, "failed to remove benchmark data"),
        }
    }
    settings.set_idle_state();
    ui.adjust_sensitivity();

    WorkerOutcome {
        success: failure.is_none(),
        failure,
        settings,
    }
}
