//! Command implementations behind the CLI.
//!
//! Every command returns `Result<(), TaskError>` so the binary can map the
//! outcome to an exit status in one place.

/// `archive list|show|verify`
pub mod archive;
/// `check filestatus|disk`
pub mod check;
/// `gcmd raw`
pub mod gcmd;
/// `trigger fwatch`
pub mod trigger;

use crate::notify::{Notifier, make_notifiers};
use crate::tasks::{Task, TaskError, run_task};
use crate::watch::ConfigurationError;
use crate::{OxmonContext, output};

/// Builds the notifiers selected on the command line or in the configuration.
///
/// # Errors
///
/// Returns a configuration failure if a notifier name is unknown.
pub fn resolve_notifiers(
    ctx: &OxmonContext,
    overrides: &[String],
) -> Result<Vec<Box<dyn Notifier>>, TaskError> {
    make_notifiers(&ctx.notifier_names(overrides))
        .map_err(|e| anyhow::Error::new(ConfigurationError::Invalid(format!("{e:#}"))).into())
}

/// Runs `task` through the harness and prints its status line on success.
fn run_and_report(task: &dyn Task, notifiers: &[Box<dyn Notifier>]) -> Result<(), TaskError> {
    let status = run_task(task, notifiers)?;
    output::success(&status);
    Ok(())
}
