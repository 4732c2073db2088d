use crate::OxmonContext;
use crate::cli::FwatchArgs;
use crate::notify::Notifier;
use crate::tasks::{FileWatchCopy, TaskError};
use crate::watch::{ConfigurationError, WatchSettings};
use anyhow::Context;

/// Watch settings from the `[watch]` config section, overridden by flags.
///
/// # Errors
///
/// Returns an error if the configured interval does not parse
pub fn fwatch_settings(ctx: &OxmonContext, args: &FwatchArgs) -> anyhow::Result<WatchSettings> {
    let mut settings = ctx
        .config
        .watch
        .settings(&args.watch, &args.archive)
        .map_err(|e| ConfigurationError::Invalid(format!("{e:#}")))?;

    if let Some(interval) = args.interval {
        settings.interval = interval;
    }
    if let Some(max_cycles) = args.max_cycles {
        settings.max_cycles = Some(max_cycles);
    }
    if let Some(threads) = args.threads {
        settings.threads = usize::try_from(threads).context("Thread count out of range")?;
    }

    Ok(settings)
}

/// Execute `trigger fwatch`: run the watcher until its cycle budget is spent
/// or SIGINT/SIGTERM arrives.
///
/// # Errors
///
/// Returns an error if the watcher cannot start
pub fn fwatch(
    ctx: &OxmonContext,
    args: &FwatchArgs,
    notifiers: &[Box<dyn Notifier>],
) -> Result<(), TaskError> {
    let settings = fwatch_settings(ctx, args)?;
    let task = FileWatchCopy::new(settings).with_signal_handling(true);
    super::run_and_report(&task, notifiers)
}
