//! Uniform harness for one-shot checks and long-running triggers.
//!
//! Every command runs as a [`Task`]. [`run_task`] executes it, forwards
//! alarms and failures to the configured notifiers, and hands the outcome
//! back so the binary can pick an exit status.

/// Disk usage checker
pub mod disk;
/// File presence, age and size checker
pub mod file_status;
/// Directory-watch archiver trigger
pub mod fwatch;
/// Arbitrary command run under the harness
pub mod raw_cmd;

use crate::notify::{Notifier, notify_all};
use crate::watch::ConfigurationError;
use chrono::Utc;
use std::fmt;
use tracing::{error, info, warn};

pub use disk::DiskChecker;
pub use file_status::{FileStatusChecker, FileStatusOptions};
pub use fwatch::FileWatchCopy;
pub use raw_cmd::{OutputTarget, RawCommand};

/// Exit status for a raised alarm.
pub const EXIT_ALARM: i32 = 1;

/// Exit status for any other failure.
pub const EXIT_FAILURE: i32 = 2;

/// How a task can fail.
#[derive(Debug)]
pub enum TaskError {
    /// The task ran and found a problem it exists to detect
    Alarm(String),
    /// The task could not do its job
    Failed(anyhow::Error),
}

impl TaskError {
    /// Raises an alarm with `message`.
    pub fn alarm(message: impl Into<String>) -> Self {
        Self::Alarm(message.into())
    }

    /// Process exit status for this failure.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Alarm(_) => EXIT_ALARM,
            Self::Failed(_) => EXIT_FAILURE,
        }
    }

    /// Whether the failure stems from invalid watcher configuration.
    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        match self {
            Self::Alarm(_) => false,
            Self::Failed(e) => e.chain().any(|cause| cause.is::<ConfigurationError>()),
        }
    }
}

impl fmt::Display for TaskError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Alarm(msg) => write!(f, "{msg}"),
            Self::Failed(e) => write!(f, "{e:#}"),
        }
    }
}

impl std::error::Error for TaskError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Alarm(_) => None,
            Self::Failed(e) => Some(e.as_ref()),
        }
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(e: anyhow::Error) -> Self {
        Self::Failed(e)
    }
}

/// Something the harness can run.
pub trait Task {
    /// Short name used in notification subjects.
    fn name(&self) -> &'static str;

    /// Does the work and returns a status line.
    ///
    /// # Errors
    ///
    /// Returns [`TaskError::Alarm`] for problems the task detects and
    /// [`TaskError::Failed`] when it cannot run.
    fn execute(&self) -> Result<String, TaskError>;
}

/// Runs `task`, notifying on alarm or failure.
///
/// # Errors
///
/// Returns the task's own error after notifications have been sent.
pub fn run_task(task: &dyn Task, notifiers: &[Box<dyn Notifier>]) -> Result<String, TaskError> {
    match task.execute() {
        Ok(status) => {
            info!(task = task.name(), status = %status, "task finished");
            Ok(status)
        }
        Err(err @ TaskError::Alarm(_)) => {
            info!(task = task.name(), alarm = %err, "raising alarm; will attempt to notify");
            let subject = format!("oxmon alarm for {}", task.name());
            let message = format!(
                "{subject} at UTC {}\n{err}",
                Utc::now().format("%Y-%m-%d %H:%M:%S%.6f")
            );
            notify_all(notifiers, &subject, &message);
            Err(err)
        }
        Err(err) if err.is_configuration_error() => {
            warn!(task = task.name(), error = %err, "task failed; will attempt to notify");
            notify_all(
                notifiers,
                "Error: oxmon failed",
                &format!("Error: oxmon failed:\n{err}"),
            );
            Err(err)
        }
        Err(err) => {
            error!(task = task.name(), error = %err, "unexpected failure; will attempt to notify");
            notify_all(
                notifiers,
                "Error: oxmon unexpected exception",
                &format!("Error: oxmon unexpected exception:\n{err}"),
            );
            Err(err)
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::notify::Notifier;
    use std::sync::{Arc, Mutex};

    /// Notifier that keeps every notification in memory.
    #[derive(Clone, Default)]
    pub struct RecordingNotifier {
        pub sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl RecordingNotifier {
        pub fn boxed(&self) -> Vec<Box<dyn Notifier>> {
            vec![Box::new(self.clone())]
        }

        pub fn subjects(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|(s, _)| s.clone())
                .collect()
        }
    }

    /// Notifier whose every send fails.
    pub struct FailingNotifier;

    impl Notifier for FailingNotifier {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn send(&self, _subject: &str, _message: &str) -> anyhow::Result<()> {
            anyhow::bail!("sink unreachable")
        }
    }

    impl Notifier for RecordingNotifier {
        fn name(&self) -> &'static str {
            "recording"
        }

        fn send(&self, subject: &str, message: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((subject.to_string(), message.to_string()));
            Ok(())
        }
    }
}
