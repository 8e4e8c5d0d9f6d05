//! Status line rendering.
//!
//! [`ProgressDisplay`] turns the coordinator's [`UiEvent`]s into a single
//! indicatif status line: files done, bytes transferred, the rate since the
//! previous snapshot and the average rate since the run started.

use crate::download::UiEvent;
use crate::progress::ProgressBarOpts;

use console::style;
use indicatif::{HumanBytes, ProgressBar};
use reqwest::Url;
use std::time::{Duration, Instant};

/// Renders the run's status line.
pub struct ProgressDisplay {
    /// The status line.
    bar: ProgressBar,
    /// Clear the status line when finished.
    clear: bool,
    /// Number of files in the run.
    total_files: usize,
    /// Files reported done so far.
    files_done: usize,
    /// Run start.
    started: Instant,
    /// Previous snapshot, for the instantaneous rate.
    last: (Instant, u64),
}

impl ProgressDisplay {
    /// Create a new status line for a run of `total_files` files.
    pub fn new(opts: ProgressBarOpts, total_files: usize) -> Self {
        let clear = opts.clear;
        let bar = opts.to_progress_bar();
        let started = Instant::now();
        bar.set_message(status_line(0, total_files, 0, 0.0, 0.0));
        bar.tick();

        Self {
            bar,
            clear,
            total_files,
            files_done: 0,
            started,
            last: (started, 0),
        }
    }

    /// Number of files reported done.
    pub fn files_done(&self) -> usize {
        self.files_done
    }

    /// Time since the display was created.
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Apply one event to the status line.
    pub fn render(&mut self, event: &UiEvent) {
        match event {
            UiEvent::FileDone(url) => self.file_done(url),
            UiEvent::BytesProgress(total) => self.bytes(*total, Instant::now()),
            UiEvent::TerminalMessage(text) => self.bar.println(text),
        }
    }

    fn file_done(&mut self, url: &Url) {
        self.files_done += 1;
        tracing::debug!(%url, done = self.files_done, "File done");
        self.bar.inc(1);
    }

    fn bytes(&mut self, total: u64, now: Instant) {
        let (last_time, last_total) = self.last;
        let rate = rate(total.saturating_sub(last_total), now - last_time);
        let avg = rate_since(total, self.started, now);
        self.last = (now, total);

        self.bar
            .set_message(status_line(self.files_done, self.total_files, total, rate, avg));
    }

    /// Finish the status line, printing the final totals.
    pub fn finish(self, failures: usize) {
        let total = self.last.1;
        let avg = rate_since(total, self.started, Instant::now());
        let line = status_line(self.files_done, self.total_files, total, avg, avg);

        if self.clear {
            self.bar.finish_and_clear();
        } else {
            self.bar.finish_with_message(line);
        }

        if failures > 0 && !self.bar.is_hidden() {
            self.bar
                .println(style(format!("{} failed", failures)).red().to_string());
        }
    }
}

/// Bytes per second over `elapsed`, zero for an empty interval.
pub fn rate(bytes: u64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs <= 0.0 {
        return 0.0;
    }
    bytes as f64 / secs
}

fn rate_since(total: u64, started: Instant, now: Instant) -> f64 {
    rate(total, now.saturating_duration_since(started))
}

/// Format the status line message.
pub fn status_line(
    files_done: usize,
    total_files: usize,
    bytes: u64,
    rate: f64,
    avg: f64,
) -> String {
    format!(
        "{}/{} files  {}  {}/s (avg {}/s)",
        files_done,
        total_files,
        HumanBytes(bytes),
        HumanBytes(rate as u64),
        HumanBytes(avg as u64),
    )
}
