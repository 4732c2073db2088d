//! Turns SIGINT/SIGTERM into a stop request so an in-flight archive write can
//! finish before the process exits.

use super::StopHandle;
use anyhow::{Result, bail};
use once_cell::sync::OnceCell;

/// Handle stopped by the signal handler; set once per process.
static TERMINATION_TARGET: OnceCell<StopHandle> = OnceCell::new();

/// Signal handler body: an atomic store, then the default disposition is
/// restored so a second signal terminates immediately. Both are
/// async-signal-safe.
#[cfg(unix)]
extern "C" fn on_termination(signal: libc::c_int) {
    if let Some(handle) = TERMINATION_TARGET.get() {
        handle.request_stop();
    }
    // SAFETY: signal(2) is async-signal-safe and SIG_DFL is always valid.
    unsafe {
        libc::signal(signal, libc::SIG_DFL);
    }
}

/// Route SIGINT and SIGTERM to `handle`
///
/// # Errors
///
/// Returns an error if a handler was already installed in this process or
/// the signal disposition cannot be changed
pub fn install_termination_handler(handle: &StopHandle) -> Result<()> {
    if TERMINATION_TARGET.set(handle.clone()).is_err() {
        bail!("Termination handler already installed");
    }

    #[cfg(unix)]
    for signal in [libc::SIGINT, libc::SIGTERM] {
        let handler = on_termination as extern "C" fn(libc::c_int) as libc::sighandler_t;
        // SAFETY: the handler only performs an atomic store through a
        // value initialised before the handler is registered.
        let previous = unsafe { libc::signal(signal, handler) };
        if previous == libc::SIG_ERR {
            bail!(
                "Failed to install handler for signal {signal}: {}",
                std::io::Error::last_os_error()
            );
        }
    }

    #[cfg(not(unix))]
    tracing::debug!("signal handling unavailable on this platform; stop via process kill");

    Ok(())
}
