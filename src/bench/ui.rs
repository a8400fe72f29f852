//! UI sink and the worker-to-UI event channel
//!
//! The worker never calls a front end directly. It sends [`BenchEvent`]s over
//! a bounded tokio channel and the consumer replays them, in order, against
//! its own [`BenchmarkUi`] with [`pump_events`].

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::debug;

use crate::bench::progress::{CancelToken, ProgressChannel};
use crate::models::{DiskMark, DiskRun, IoMode};

/// Capacity of the worker event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Longest the worker waits for room in a full channel before dropping an event
pub const EVENT_SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Calls the engine makes into a front end. It never queries state back.
pub trait BenchmarkUi: Send {
    fn update_legend(&mut self);
    fn reset_test_data(&mut self);
    fn add_write_mark(&mut self, mark: &DiskMark);
    fn add_read_mark(&mut self, mark: &DiskMark);
    fn update_title(&mut self, disk_info: &str);
    fn adjust_sensitivity(&mut self);
    fn show_plain_message_dialog(&mut self, text: &str, title: &str);
    fn show_error_message_dialog(&mut self, text: &str, title: &str);
    fn add_run(&mut self, run: &DiskRun);

    fn set_progress(&mut self, _percent: u8) {}
}

/// Event produced by the worker for the UI consumer
#[derive(Debug, Clone, PartialEq)]
pub enum BenchEvent {
    Progress(u8),
    Mark(DiskMark),
    UpdateLegend,
    ResetTestData,
    UpdateTitle(String),
    AdjustSensitivity,
    PlainMessage { text: String, title: String },
    ErrorMessage { text: String, title: String },
    RunCompleted(DiskRun),
}

impl BenchEvent {
    /// Replay this event against a UI
    pub fn dispatch(self, ui: &mut dyn BenchmarkUi) {
        match self {
            BenchEvent::Progress(percent) => ui.set_progress(percent),
            BenchEvent::Mark(mark) => match mark.mode {
                IoMode::Write => ui.add_write_mark(&mark),
                IoMode::Read => ui.add_read_mark(&mark),
            },
            BenchEvent::UpdateLegend => ui.update_legend(),
            BenchEvent::ResetTestData => ui.reset_test_data(),
            BenchEvent::UpdateTitle(info) => ui.update_title(&info),
            BenchEvent::AdjustSensitivity => ui.adjust_sensitivity(),
            BenchEvent::PlainMessage { text, title } => ui.show_plain_message_dialog(&text, &title),
            BenchEvent::ErrorMessage { text, title } => ui.show_error_message_dialog(&text, &title),
            BenchEvent::RunCompleted(run) => ui.add_run(&run),
        }
    }
}

/// Drain `rx` until every sender is gone, dispatching each event in order.
/// Returns the number of events handled.
pub async fn pump_events(mut rx: mpsc::Receiver<BenchEvent>, ui: &mut dyn BenchmarkUi) -> usize {
    let mut handled = 0;
    while let Some(event) = rx.recv().await {
        event.dispatch(ui);
        handled += 1;
    }
    handled
}

/// Sending half of the event channel, usable from a blocking worker thread
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::Sender<BenchEvent>,
    handle: Handle,
}

impl EventSender {
    /// `handle` must belong to a runtime the sending thread is not running on
    pub fn new(tx: mpsc::Sender<BenchEvent>, handle: Handle) -> Self {
        Self { tx, handle }
    }

    /// Ordered send with a bounded wait. Returns false if the event was dropped.
    pub fn send(&self, event: BenchEvent) -> bool {
        let tx = self.tx.clone();
        let sent = self
            .handle
            .block_on(async move { tokio::time::timeout(EVENT_SEND_TIMEOUT, tx.send(event)).await });
        match sent {
            Ok(Ok(())) => true,
            Ok(Err(_)) => {
                debug!("event receiver closed");
                false
            }
            Err(_) => {
                debug!("event channel full for {:?}, dropping event", EVENT_SEND_TIMEOUT);
                false
            }
        }
    }

    /// Non-blocking send for events a later one supersedes
    pub fn try_send(&self, event: BenchEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => false,
            Err(TrySendError::Closed(_)) => false,
        }
    }
}

/// [`BenchmarkUi`] that forwards every call onto the event channel
#[derive(Debug, Clone)]
pub struct ChannelUi {
    events: EventSender,
}

impl ChannelUi {
    pub fn new(events: EventSender) -> Self {
        Self { events }
    }
}

impl BenchmarkUi for ChannelUi {
    fn update_legend(&mut self) {
        self.events.send(BenchEvent::UpdateLegend);
    }

    fn reset_test_data(&mut self) {
        self.events.send(BenchEvent::ResetTestData);
    }

    fn add_write_mark(&mut self, mark: &DiskMark) {
        self.events.send(BenchEvent::Mark(mark.clone()));
    }

    fn add_read_mark(&mut self, mark: &DiskMark) {
        self.events.send(BenchEvent::Mark(mark.clone()));
    }

    fn update_title(&mut self, disk_info: &str) {
        self.events.send(BenchEvent::UpdateTitle(disk_info.to_string()));
    }

    fn adjust_sensitivity(&mut self) {
        self.events.send(BenchEvent::AdjustSensitivity);
    }

    fn show_plain_message_dialog(&mut self, text: &str, title: &str) {
        self.events.send(BenchEvent::PlainMessage {
            text: text.to_string(),
            title: title.to_string(),
        });
    }

    fn show_error_message_dialog(&mut self, text: &str, title: &str) {
        self.events.send(BenchEvent::ErrorMessage {
            text: text.to_string(),
            title: title.to_string(),
        });
    }

    fn add_run(&mut self, run: &DiskRun) {
        self.events.send(BenchEvent::RunCompleted(run.clone()));
    }

    fn set_progress(&mut self, percent: u8) {
        self.events.try_send(BenchEvent::Progress(percent));
    }
}

/// [`ProgressChannel`] backed by the event channel and a [`CancelToken`]
#[derive(Debug, Clone)]
pub struct ChannelProgress {
    events: EventSender,
    cancel: CancelToken,
    last_percent: Option<u8>,
}

impl ChannelProgress {
    pub fn new(events: EventSender, cancel: CancelToken) -> Self {
        Self {
            events,
            cancel,
            last_percent: None,
        }
    }
}

impl ProgressChannel for ChannelProgress {
    fn publish(&mut self, mark: &DiskMark) {
        self.events.send(BenchEvent::Mark(mark.clone()));
    }

    fn set_progress(&mut self, percent: u8) {
        // Only changes are worth a slot in the channel
        if self.last_percent == Some(percent) {
            return;
        }
        if self.events.try_send(BenchEvent::Progress(percent)) {
            self.last_percent = Some(percent);
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct CallLog {
        calls: Vec<String>,
    }

    impl BenchmarkUi for CallLog {
        fn update_legend(&mut self) {
            self.calls.push("legend".into());
        }
        fn reset_test_data(&mut self) {
            self.calls.push("reset".into());
        }
        fn add_write_mark(&mut self, mark: &DiskMark) {
            self.calls.push(format!("write:{}", mark.mark_number));
        }
        fn add_read_mark(&mut self, mark: &DiskMark) {
            self.calls.push(format!("read:{}", mark.mark_number));
        }
        fn update_title(&mut self, disk_info: &str) {
            self.calls.push(format!("title:{}", disk_info));
        }
        fn adjust_sensitivity(&mut self) {
            self.calls.push("sensitivity".into());
        }
        fn show_plain_message_dialog(&mut self, _text: &str, title: &str) {
            self.calls.push(format!("plain:{}", title));
        }
        fn show_error_message_dialog(&mut self, _text: &str, title: &str) {
            self.calls.push(format!("error:{}", title));
        }
        fn add_run(&mut self, run: &DiskRun) {
            self.calls.push(format!("run:{}", run.mode));
        }
        fn set_progress(&mut self, percent: u8) {
            self.calls.push(format!("progress:{}", percent));
        }
    }

    #[tokio::test]
    async fn test_pump_dispatches_marks_by_mode_in_order() {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        tx.send(BenchEvent::UpdateTitle("sda1".into())).await.unwrap();
        tx.send(BenchEvent::Mark(DiskMark::new(IoMode::Write, 0))).await.unwrap();
        tx.send(BenchEvent::Progress(50)).await.unwrap();
        tx.send(BenchEvent::Mark(DiskMark::new(IoMode::Read, 0))).await.unwrap();
        tx.send(BenchEvent::ErrorMessage {
            text: "x".into(),
            title: "Unable to READ".into(),
        })
        .await
        .unwrap();
        drop(tx);

        let mut ui = CallLog::default();
        let handled = pump_events(rx, &mut ui).await;
        assert_eq!(handled, 5);
        assert_eq!(
            ui.calls,
            vec!["title:sda1", "write:0", "progress:50", "read:0", "error:Unable to READ"]
        );
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_channel_progress_from_blocking_thread() {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let events = EventSender::new(tx, Handle::current());
        let cancel = CancelToken::new();
        let mut progress = ChannelProgress::new(events.clone(), cancel.clone());

        let worker = tokio::task::spawn_blocking(move || {
            progress.set_progress(10);
            progress.set_progress(10);
            progress.publish(&DiskMark::new(IoMode::Write, 3));
            progress.set_progress(20);
            cancel.cancel();
            progress.is_cancelled()
        });
        assert!(worker.await.unwrap());
        drop(events);

        let mut ui = CallLog::default();
        pump_events(rx, &mut ui).await;
        assert_eq!(ui.calls, vec!["progress:10", "write:3", "progress:20"]);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_send_after_receiver_closed_is_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let events = EventSender::new(tx, Handle::current());
        let sent = tokio::task::spawn_blocking(move || events.send(BenchEvent::UpdateLegend))
            .await
            .unwrap();
        assert!(!sent);
    }
}
