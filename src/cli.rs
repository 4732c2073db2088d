//! Command-line interface definitions for oxmon.
//!
//! This module contains all CLI argument parsing structures using clap's derive macros.
//! The CLI definitions are shared between the main binary and build tools (like xtask)
//! for man page generation.
//!
//! Note: Field-level documentation is provided via clap attributes (#[arg(help = "...")]),
//! so we allow missing_docs for this module to avoid redundant documentation.

#![allow(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

use crate::tasks::OutputTarget;
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::time::Duration;

/// Main CLI structure for oxmon.
#[derive(Parser)]
#[command(
    name = "oxmon",
    version = crate::VERSION,
    about = "Simple monitoring: checks, triggers and a directory-watch archiver",
    long_about = "Runs one-shot checks and long-running triggers, sending alarms and failures to notifiers"
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Show verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Suppress informational messages
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (default: $OXMON_CONFIG_PATH or ~/.config/oxmon/config.toml)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Notifier to alert on alarms and failures; repeat for several
    #[arg(long = "notifier", global = true, value_name = "NAME")]
    pub notifiers: Vec<String>,
}

/// All available commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Run a long-lived trigger
    Trigger {
        #[command(subcommand)]
        trigger: TriggerCommand,
    },

    /// Run a one-shot check
    Check {
        #[command(subcommand)]
        check: CheckCommand,
    },

    /// Run a general command with notification on failure
    Gcmd {
        #[command(subcommand)]
        gcmd: GcmdCommand,
    },

    /// Inspect an archive written by `trigger fwatch`
    Archive {
        #[command(subcommand)]
        action: ArchiveAction,
    },

    /// Print the version
    Version,

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Trigger subcommands.
#[derive(Subcommand)]
pub enum TriggerCommand {
    /// Watch a directory and archive every distinct file content seen
    Fwatch(FwatchArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FwatchArgs {
    /// Directory to watch
    #[arg(long, value_name = "DIR")]
    pub watch: PathBuf,

    /// Directory receiving the archive
    #[arg(long, value_name = "DIR")]
    pub archive: PathBuf,

    /// Pause between scans, e.g. "1s" or "500ms"
    #[arg(long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Stop after this many scan cycles
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub max_cycles: Option<u64>,

    /// Worker threads per scan cycle
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=64))]
    pub threads: Option<u64>,
}

/// Check subcommands.
#[derive(Subcommand)]
pub enum CheckCommand {
    /// Check file existence, age and size
    Filestatus(FilestatusArgs),

    /// Check how full a filesystem is
    Disk(DiskArgs),
}

#[derive(Args, Debug, Clone)]
pub struct FilestatusArgs {
    /// Files to check
    pub targets: Vec<PathBuf>,

    /// Glob pattern of files to check; must match at least one file
    #[arg(long = "globtarget", value_name = "PATTERN")]
    pub glob_targets: Vec<String>,

    /// Files must exist
    #[arg(long)]
    pub live: bool,

    /// Files must not exist
    #[arg(long, conflicts_with = "live")]
    pub dead: bool,

    /// Minimum size in kilobytes (1 KB = 1000 bytes)
    #[arg(long, allow_negative_numbers = true)]
    pub min_size_kb: Option<f64>,

    /// Maximum age in hours since last modification
    #[arg(long = "max-age-in-hours", allow_negative_numbers = true)]
    pub max_age_hours: Option<f64>,

    /// Maximum age in days since last modification
    #[arg(long = "max-age-in-days", allow_negative_numbers = true)]
    pub max_age_days: Option<f64>,
}

#[derive(Args, Debug, Clone)]
pub struct DiskArgs {
    /// Any path on the filesystem to check
    #[arg(long, default_value = "/")]
    pub path: PathBuf,

    /// Alarm when more than this percentage is used
    #[arg(long, allow_negative_numbers = true)]
    pub max_used_pct: f64,
}

/// General command subcommands.
#[derive(Subcommand)]
pub enum GcmdCommand {
    /// Run a command or shell script and notify if it exits non-zero
    Raw(RawArgs),
}

#[derive(Args, Debug, Clone)]
pub struct RawArgs {
    /// Command to run
    #[arg(long)]
    pub cmd: String,

    /// Comma-separated arguments for --cmd; ':' becomes '-', so ":v" passes "-v"
    #[arg(long, default_value = "", allow_hyphen_values = true)]
    pub args: String,

    /// Where the command's stdout goes: @STDOUT, @STDERR, @NULL or a file path
    #[arg(long, default_value = "@STDOUT", value_name = "TARGET")]
    pub stdout: OutputTarget,

    /// Where the command's stderr goes: @STDOUT, @STDERR, @NULL or a file path
    #[arg(long, default_value = "@STDERR", value_name = "TARGET")]
    pub stderr: OutputTarget,

    /// Run the command line through `sh -c`
    #[arg(long)]
    pub shell: bool,
}

/// Archive subcommands.
#[derive(Subcommand)]
pub enum ArchiveAction {
    /// List archive entries with blob size and record count
    List {
        /// Archive root
        #[arg(long, value_name = "DIR")]
        archive: PathBuf,
    },

    /// Show the provenance records of one entry
    Show {
        /// Archive root
        #[arg(long, value_name = "DIR")]
        archive: PathBuf,

        /// Entry fingerprint (32 hex digits)
        fingerprint: String,
    },

    /// Re-hash every blob and report entries whose content does not match
    Verify {
        /// Archive root
        #[arg(long, value_name = "DIR")]
        archive: PathBuf,
    },
}
