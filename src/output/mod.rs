//! Output formatting and styling for the oxmon CLI.
//!
//! Human-facing messages go to stderr, coloured by severity and filtered by a
//! process-wide verbosity. Data a caller may want to pipe (archive listings,
//! provenance records, task status) is printed to stdout by the commands
//! themselves.

use colored::Colorize;
use std::sync::atomic::{AtomicU8, Ordering};

/// How chatty the CLI is on stderr.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Verbosity {
    /// Warnings and errors only
    Quiet = 0,
    /// Progress and status lines
    Normal = 1,
    /// Per-entry detail as well
    Verbose = 2,
}

impl Verbosity {
    /// Picks the level from the `-v`/`-q` flags; `-q` wins if both are set.
    #[must_use]
    pub const fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }

    /// Log filter directive implied by this level, when it overrides the configured one.
    #[must_use]
    pub const fn log_directive(self) -> Option<&'static str> {
        match self {
            Self::Quiet => Some("warn"),
            Self::Normal => None,
            Self::Verbose => Some("debug"),
        }
    }

    /// Inverse of `as u8`; unknown values fall back to `Normal`.
    const fn from_raw(raw: u8) -> Self {
        match raw {
            0 => Self::Quiet,
            2 => Self::Verbose,
            _ => Self::Normal,
        }
    }
}

/// Severity of a CLI message, which fixes its colour and the verbosity it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tone {
    /// Completed work
    Success,
    /// Failed work
    Error,
    /// Suspicious but not fatal
    Warning,
    /// Progress
    Info,
    /// Per-entry detail
    Detail,
}

impl Tone {
    /// Lowest verbosity at which this tone is printed.
    const fn needs(self) -> Verbosity {
        match self {
            Self::Error | Self::Warning => Verbosity::Quiet,
            Self::Success | Self::Info => Verbosity::Normal,
            Self::Detail => Verbosity::Verbose,
        }
    }

    fn paint(self, message: &str) -> colored::ColoredString {
        match self {
            Self::Success => message.green(),
            Self::Error => message.red().bold(),
            Self::Warning => message.yellow().bold(),
            Self::Info | Self::Detail => message.dimmed(),
        }
    }
}

/// Process-wide verbosity, stored as the enum discriminant.
static VERBOSITY: AtomicU8 = AtomicU8::new(Verbosity::Normal as u8);

/// Sets the process-wide verbosity.
pub fn set_verbosity(level: Verbosity) {
    VERBOSITY.store(level as u8, Ordering::Relaxed);
}

/// Current process-wide verbosity.
pub fn get_verbosity() -> Verbosity {
    Verbosity::from_raw(VERBOSITY.load(Ordering::Relaxed))
}

/// Prints `message` to stderr if the current verbosity allows its tone.
fn emit(tone: Tone, message: &str) {
    if get_verbosity() >= tone.needs() {
        eprintln!("{}", tone.paint(message));
    }
}

/// Green status line, hidden by `-q`.
pub fn success(message: &str) {
    emit(Tone::Success, message);
}

/// Bold red line, always shown.
pub fn error(message: &str) {
    emit(Tone::Error, message);
}

/// Bold yellow line, always shown.
pub fn warning(message: &str) {
    emit(Tone::Warning, message);
}

/// Dimmed progress line, hidden by `-q`.
pub fn info(message: &str) {
    emit(Tone::Info, message);
}

/// Dimmed detail, shown only with `-v`.
pub fn verbose(message: &str) {
    emit(Tone::Detail, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_levels() {
        assert_eq!(Verbosity::from_raw(Verbosity::Quiet as u8), Verbosity::Quiet);
        assert_eq!(Verbosity::from_raw(Verbosity::Verbose as u8), Verbosity::Verbose);
        assert_eq!(Verbosity::from_raw(7), Verbosity::Normal);
    }

    #[test]
    fn test_from_flags() {
        assert_eq!(Verbosity::from_flags(false, false), Verbosity::Normal);
        assert_eq!(Verbosity::from_flags(true, false), Verbosity::Verbose);
        assert_eq!(Verbosity::from_flags(false, true), Verbosity::Quiet);
        assert_eq!(Verbosity::from_flags(true, true), Verbosity::Quiet);
    }

    #[test]
    fn test_tones_follow_verbosity() {
        assert!(Verbosity::Quiet >= Tone::Error.needs());
        assert!(Verbosity::Quiet < Tone::Info.needs());
        assert!(Verbosity::Normal >= Tone::Success.needs());
        assert!(Verbosity::Normal < Tone::Detail.needs());
        assert!(Verbosity::Verbose >= Tone::Detail.needs());
    }

    #[test]
    fn test_log_directive() {
        assert_eq!(Verbosity::Quiet.log_directive(), Some("warn"));
        assert_eq!(Verbosity::Normal.log_directive(), None);
        assert_eq!(Verbosity::Verbose.log_directive(), Some("debug"));
    }
}
