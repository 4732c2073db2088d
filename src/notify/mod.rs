//! Notification sinks used by the task harness to report alarms and failures.

use anyhow::{Result, bail};
use std::io::Write;
use tracing::{info, warn};

/// Names accepted by [`make_notifier`].
pub const KNOWN_NOTIFIERS: &[&str] = &["echo", "loginfo"];

/// A destination for `(subject, message)` notifications.
pub trait Notifier: Send + Sync {
    /// Name the notifier was selected by.
    fn name(&self) -> &'static str;

    /// Delivers one notification.
    ///
    /// # Errors
    ///
    /// Returns an error if delivery fails.
    fn send(&self, subject: &str, message: &str) -> Result<()>;
}

/// Prints the subject and message to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct EchoNotifier;

impl Notifier for EchoNotifier {
    fn name(&self) -> &'static str {
        "echo"
    }

    fn send(&self, subject: &str, message: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{subject}")?;
        writeln!(stdout, "{message}")?;
        stdout.flush()?;
        Ok(())
    }
}

/// Emits the notification as an `info` tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogInfoNotifier;

impl Notifier for LogInfoNotifier {
    fn name(&self) -> &'static str {
        "loginfo"
    }

    fn send(&self, subject: &str, message: &str) -> Result<()> {
        info!(subject, "{message}");
        Ok(())
    }
}

/// Builds the notifier registered under `kind`.
///
/// # Errors
///
/// Returns an error if `kind` is not one of [`KNOWN_NOTIFIERS`].
pub fn make_notifier(kind: &str) -> Result<Box<dyn Notifier>> {
    match kind {
        "echo" => Ok(Box::new(EchoNotifier)),
        "loginfo" => Ok(Box::new(LogInfoNotifier)),
        other => bail!(
            "Unknown notifier '{other}' (expected one of: {})",
            KNOWN_NOTIFIERS.join(", ")
        ),
    }
}

/// Builds every notifier in `kinds`, in order.
///
/// # Errors
///
/// Returns an error on the first unknown name.
pub fn make_notifiers<S: AsRef<str>>(kinds: &[S]) -> Result<Vec<Box<dyn Notifier>>> {
    kinds.iter().map(|k| make_notifier(k.as_ref())).collect()
}

/// Sends to every notifier; a failing sink is logged and does not stop the others.
pub fn notify_all(notifiers: &[Box<dyn Notifier>], subject: &str, message: &str) {
    for notifier in notifiers {
        if let Err(e) = notifier.send(subject, message) {
            warn!(notifier = notifier.name(), error = %e, "failed to send notification");
        }
    }
}
