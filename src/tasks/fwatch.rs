use super::{Task, TaskError};
use crate::watch::signals::install_termination_handler;
use crate::watch::{ScanLoop, StopReason, WatchSettings};
use anyhow::Context;

/// Trigger that keeps an archive of every file ever seen under a directory.
pub struct FileWatchCopy {
    settings: WatchSettings,
    handle_signals: bool,
}

impl FileWatchCopy {
    #[must_use]
    pub const fn new(settings: WatchSettings) -> Self {
        Self {
            settings,
            handle_signals: false,
        }
    }

    /// Stop cleanly on SIGINT/SIGTERM. Only one watcher per process may do this.
    #[must_use]
    pub const fn with_signal_handling(mut self, enabled: bool) -> Self {
        self.handle_signals = enabled;
        self
    }
}

impl Task for FileWatchCopy {
    fn name(&self) -> &'static str {
        "fwatch"
    }

    fn execute(&self) -> Result<String, TaskError> {
        let mut scan =
            ScanLoop::new(self.settings.clone()).context("Failed to start watcher")?;

        if self.handle_signals {
            install_termination_handler(&scan.stop_handle())?;
        }

        let summary = scan.run()?;
        let why = match summary.reason {
            StopReason::CyclesExhausted => "cycle limit reached",
            StopReason::StopRequested => "stop requested",
        };

        Ok(format!(
            "Watched {} for {} cycle(s) ({why}): {} observation(s) archived, {} new entr{}",
            scan.settings().watch.display(),
            summary.cycles,
            summary.totals.archived,
            summary.totals.entries_created,
            if summary.totals.entries_created == 1 { "y" } else { "ies" },
        ))
    }
}
