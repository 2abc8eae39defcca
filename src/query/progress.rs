use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Where the poller reports what it is doing while a query runs.
pub trait ProgressSink: Send + Sync {
    fn update(&self, message: &str);

    /// Final message of a poll call; sinks that render live state may
    /// freeze it here.
    fn finish(&self, message: &str) {
        self.update(message);
    }
}

/// Used for machine-readable output where nothing but the result may be
/// printed.
pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn update(&self, _message: &str) {}
}

pub struct SpinnerProgress {
    pb: ProgressBar,
}

impl SpinnerProgress {
    pub fn new() -> Self {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} [{elapsed_precise}]")
                .expect("Invalid progress bar template"),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        Self { pb }
    }
}

impl Default for SpinnerProgress {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressSink for SpinnerProgress {
    fn update(&self, message: &str) {
        self.pb.set_message(message.to_string());
    }

    fn finish(&self, message: &str) {
        self.pb.finish_with_message(message.to_string());
    }
}

impl Drop for SpinnerProgress {
    fn drop(&mut self) {
        if !self.pb.is_finished() {
            self.pb.finish_and_clear();
        }
    }
}

/// Picks the live spinner or the silent sink.
pub fn progress_sink(show_progress: bool) -> Box<dyn ProgressSink> {
    if show_progress {
        Box::new(SpinnerProgress::new())
    } else {
        Box::new(SilentProgress)
    }
}
