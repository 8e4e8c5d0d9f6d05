//! The progress and cancellation loop.
//!
//! The coordinator owns the lifetime of a run. It waits on four sources at
//! once and reacts to whichever is ready first:
//!
//! - the periodic UI tick, which renders a byte counter snapshot;
//! - the done signals of the workers;
//! - the `FileDone` events the workers emit per finished file;
//! - the cancellation token, cancelled from outside on an interrupt.
//!
//! It returns [`CoordinatorExit::AllWorkersDone`] once every worker has
//! signalled, or [`CoordinatorExit::Interrupted`] as soon as the token is
//! cancelled. It never cancels transfers itself.

use crate::download::UiEvent;
use crate::progress::{ByteCounter, ProgressDisplay};

use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Snapshots taken during the first second of a run are not rendered.
const QUIET_START: Duration = Duration::from_secs(1);

/// Sends the worker id once when dropped, so a worker signals done on every
/// exit path, panics included.
#[derive(Debug)]
pub(crate) struct DoneSignal {
    id: usize,
    tx: UnboundedSender<usize>,
}

impl DoneSignal {
    pub(crate) fn new(id: usize, tx: UnboundedSender<usize>) -> Self {
        Self { id, tx }
    }
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        let _ = self.tx.send(self.id);
    }
}

/// Channel carrying worker done signals.
pub(crate) fn done_channel() -> (UnboundedSender<usize>, UnboundedReceiver<usize>) {
    mpsc::unbounded_channel()
}

/// Why the coordinator stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorExit {
    AllWorkersDone,
    Interrupted,
}

pub(crate) struct Coordinator {
    display: ProgressDisplay,
    counter: ByteCounter,
    ui_delay: Duration,
    workers: usize,
}

impl Coordinator {
    pub(crate) fn new(
        display: ProgressDisplay,
        counter: ByteCounter,
        ui_delay: Duration,
        workers: usize,
    ) -> Self {
        Self {
            display,
            counter,
            ui_delay,
            workers,
        }
    }

    /// Run until every worker is done or `cancel` fires. Hands the display
    /// back so the caller can print the final totals.
    pub(crate) async fn run(
        mut self,
        mut events: UnboundedReceiver<UiEvent>,
        mut done: UnboundedReceiver<usize>,
        cancel: CancellationToken,
    ) -> (CoordinatorExit, ProgressDisplay) {
        let period = self.ui_delay.max(Duration::from_millis(1));
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut remaining = self.workers;
        while remaining > 0 {
            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(remaining, "Interrupted with workers still running");
                    self.display
                        .render(&UiEvent::TerminalMessage("Interrupted, stopping".into()));
                    return (CoordinatorExit::Interrupted, self.display);
                }
                id = done.recv() => match id {
                    Some(id) => {
                        remaining -= 1;
                        debug!(worker = id, remaining, "Worker done");
                    }
                    // Every signal is gone, so every worker is.
                    None => remaining = 0,
                },
                Some(event) = events.recv() => self.display.render(&event),
                _ = ticker.tick() => {
                    if self.display.elapsed() > QUIET_START {
                        self.display
                            .render(&UiEvent::BytesProgress(self.counter.snapshot()));
                    }
                }
            }
        }

        while let Ok(event) = events.try_recv() {
            self.display.render(&event);
        }
        self.display
            .render(&UiEvent::BytesProgress(self.counter.snapshot()));

        (CoordinatorExit::AllWorkersDone, self.display)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::ProgressBarOpts;
    use reqwest::Url;

    fn coordinator(workers: usize, total_files: usize) -> Coordinator {
        Coordinator::new(
            ProgressDisplay::new(ProgressBarOpts::hidden(), total_files),
            ByteCounter::new(),
            Duration::from_millis(10),
            workers,
        )
    }

    #[tokio::test]
    async fn test_all_workers_done_drains_file_events() {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = done_channel();
        let signals: Vec<_> = (0..3).map(|i| DoneSignal::new(i, done_tx.clone())).collect();
        drop(done_tx);

        for i in 0..5 {
            let url = Url::parse(&format!("http://example/f{}", i)).unwrap();
            events_tx.send(UiEvent::FileDone(url)).unwrap();
        }
        drop(signals);

        let (exit, display) = coordinator(3, 5)
            .run(events_rx, done_rx, CancellationToken::new())
            .await;

        assert_eq!(exit, CoordinatorExit::AllWorkersDone);
        assert_eq!(display.files_done(), 5);
    }

    #[tokio::test]
    async fn test_cancel_while_workers_busy() {
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = done_channel();
        let busy = DoneSignal::new(0, done_tx);
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let (exit, display) = coordinator(1, 1).run(events_rx, done_rx, cancel).await;

        assert_eq!(exit, CoordinatorExit::Interrupted);
        assert_eq!(display.files_done(), 0);
        drop(busy);
    }

    #[tokio::test]
    async fn test_panicking_worker_still_signals() {
        let (_events_tx, events_rx) = mpsc::unbounded_channel();
        let (done_tx, done_rx) = done_channel();
        let signal = DoneSignal::new(0, done_tx);

        let handle = tokio::spawn(async move {
            let _signal = signal;
            panic!("worker blew up");
        });
        assert!(handle.await.is_err());

        let (exit, _) = coordinator(1, 0)
            .run(events_rx, done_rx, CancellationToken::new())
            .await;
        assert_eq!(exit, CoordinatorExit::AllWorkersDone);
    }
}
