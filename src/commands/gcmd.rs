use crate::cli::RawArgs;
use crate::notify::Notifier;
use crate::tasks::{RawCommand, TaskError};

/// Execute `gcmd raw`
///
/// # Errors
///
/// Returns a failure if the command cannot be started or exits non-zero
pub fn raw(args: RawArgs, notifiers: &[Box<dyn Notifier>]) -> Result<(), TaskError> {
    let task = RawCommand {
        cmd: args.cmd,
        args: args.args,
        stdout: args.stdout,
        stderr: args.stderr,
        shell: args.shell,
    };
    super::run_and_report(&task, notifiers)
}
