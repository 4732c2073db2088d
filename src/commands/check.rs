use crate::cli::{DiskArgs, FilestatusArgs};
use crate::notify::Notifier;
use crate::tasks::{DiskChecker, FileStatusChecker, FileStatusOptions, TaskError};

/// Execute `check filestatus`
///
/// # Errors
///
/// Returns an alarm if a file is missing, present, stale or too small, and a
/// failure if the limits are invalid
pub fn filestatus(args: FilestatusArgs, notifiers: &[Box<dyn Notifier>]) -> Result<(), TaskError> {
    let checker = FileStatusChecker::new(FileStatusOptions {
        targets: args.targets,
        glob_targets: args.glob_targets,
        live: args.live,
        dead: args.dead,
        min_size_kb: args.min_size_kb,
        max_age_hours: args.max_age_hours,
        max_age_days: args.max_age_days,
    });
    super::run_and_report(&checker, notifiers)
}

/// Execute `check disk`
///
/// # Errors
///
/// Returns an alarm if the filesystem is fuller than allowed
pub fn disk(args: &DiskArgs, notifiers: &[Box<dyn Notifier>]) -> Result<(), TaskError> {
    let checker = DiskChecker::new(&args.path, args.max_used_pct);
    super::run_and_report(&checker, notifiers)
}
