#![warn(missing_docs)]
#![warn(clippy::missing_docs_in_private_items)]
// Allow pedantic strict lints that create false positives in this codebase
#![allow(clippy::arithmetic_side_effects)] // Simple counters and size calculations cannot overflow
#![allow(clippy::float_arithmetic)] // Required for age, size and percentage checks
#![allow(clippy::indexing_slicing)] // Bounds checked by logic

//! # Oxmon - Simple Monitoring
//!
//! Oxmon runs one-shot checks and long-running triggers. Alarms and failures
//! are forwarded to notifiers, and the process exit status tells a scheduler
//! what happened (0 ok, 1 alarm, 2 failure).
//!
//! ## Features
//!
//! - **Directory-watch archiver**: `trigger fwatch` polls a directory tree and
//!   keeps every distinct file content it ever sees, keyed by an MD5
//!   fingerprint, with a log of which path produced it and when
//! - **Checks**: file presence, age and size; filesystem usage
//! - **Parallel scanning**: optional Rayon pool per scan cycle
//!
//! ## Architecture
//!
//! - [`storage`]: Content fingerprints and the on-disk archive
//! - [`scanner`]: Directory traversal for the watcher
//! - [`watch`]: The scan loop state machine and its errors
//! - [`tasks`]: The task harness, checkers and triggers
//! - [`notify`]: Notification sinks
//! - [`commands`]: Command implementations behind the CLI
//! - [`config`]: Configuration parsing and validation
//! - [`output`]: Output formatting and styling
//! - [`utils`]: Utility functions and helpers
//!
//! ## Example Usage
//!
//! ```no_run
//! use oxmon::watch::{ScanLoop, WatchSettings};
//! use std::time::Duration;
//!
//! # fn main() -> anyhow::Result<()> {
//! let settings = WatchSettings {
//!     interval: Duration::from_secs(5),
//!     max_cycles: Some(3),
//!     ..WatchSettings::new("/srv/incoming", "/srv/archive")
//! };
//!
//! let mut scan = ScanLoop::new(settings)?;
//! let summary = scan.run()?;
//! println!("archived {} observations", summary.totals.archived);
//! # Ok(())
//! # }
//! ```

/// Command-line interface definitions (argument parsing structures).
pub mod cli;

/// Command implementations behind the CLI.
pub mod commands;

/// Configuration parsing, validation, and management.
pub mod config;

/// Notification sinks for alarms and failures.
pub mod notify;

/// Output formatting and styling.
pub mod output;

/// Filesystem traversal for the watcher.
pub mod scanner;

/// Content fingerprints and the content-addressed archive.
pub mod storage;

/// Task harness, checkers and triggers.
pub mod tasks;

/// Utility functions and helpers.
pub mod utils;

/// The directory-watch scan loop.
pub mod watch;

use anyhow::Result;
use std::path::{Path, PathBuf};

/// Current version of the oxmon binary.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default configuration file path relative to home directory.
pub const DEFAULT_CONFIG_PATH: &str = ".config/oxmon/config.toml";

/// Environment variable overriding the configuration file location.
pub const CONFIG_ENV: &str = "OXMON_CONFIG_PATH";

/// Shared state for one invocation of the CLI.
///
/// Holds the loaded configuration and where it came from.
#[derive(Debug, Clone)]
pub struct OxmonContext {
    /// Path to the configuration file (which may not exist).
    pub config_path: PathBuf,

    /// Loaded configuration settings.
    pub config: config::Config,
}

impl OxmonContext {
    /// Loads the configuration from `explicit`, `$OXMON_CONFIG_PATH`, or the
    /// default location, warning about unknown fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read,
    /// parsed or validated.
    pub fn new(explicit: Option<&Path>) -> Result<Self> {
        let config_path = config::Config::resolve_path(explicit);
        let config = config::Config::load(&config_path)?;

        let validator = config::validator::ConfigValidator::new();
        if let Err(e) = validator.validate_config_file(&config_path) {
            output::warning(&format!("Configuration validation failed: {e}"));
        }

        Ok(Self {
            config_path,
            config,
        })
    }

    /// Notifier names to use: the command-line choices if any, else the configured ones.
    #[must_use]
    pub fn notifier_names(&self, overrides: &[String]) -> Vec<String> {
        if overrides.is_empty() {
            self.config.notify.notifiers.clone()
        } else {
            overrides.to_vec()
        }
    }
}
