pub mod parser;
pub mod validator;

use crate::watch::WatchSettings;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub watch: WatchConfig,

    /// Notification sinks used when none are given on the command line
    #[serde(default)]
    pub notify: NotifyConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Pause between scan cycles, as a humantime duration ("1s", "500ms")
    #[serde(default = "default_interval")]
    pub interval: String,
    /// Stop after this many cycles; absent runs until stopped
    #[serde(default)]
    pub max_cycles: Option<u64>,
    #[serde(default = "default_threads")]
    pub threads: usize,
    #[serde(default)]
    pub follow_symlinks: bool,
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    #[serde(default = "default_notifiers")]
    pub notifiers: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            max_cycles: None,
            threads: default_threads(),
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            notifiers: default_notifiers(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl WatchConfig {
    /// The configured interval as a [`Duration`].
    ///
    /// # Errors
    ///
    /// Returns an error if `interval` is not a valid humantime duration
    pub fn interval(&self) -> Result<Duration> {
        humantime::parse_duration(&self.interval)
            .with_context(|| format!("Invalid watch interval: {:?}", self.interval))
    }

    /// Watcher settings for the given roots, tuned from this section.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval does not parse
    pub fn settings(&self, watch: &Path, archive: &Path) -> Result<WatchSettings> {
        Ok(WatchSettings {
            interval: self.interval()?,
            max_cycles: self.max_cycles,
            threads: self.threads,
            follow_symlinks: self.follow_symlinks,
            ignore_patterns: self.ignore_patterns.clone(),
            ..WatchSettings::new(watch, archive)
        })
    }
}

impl Config {
    /// Load configuration from a file
    ///
    /// A missing file yields the defaults; nothing is written.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file exists but cannot be read
    /// - The file contains invalid TOML
    /// - A value fails validation
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        parser::parse_config_file(path)
    }

    /// Where the configuration lives: explicit path, then
    /// `$OXMON_CONFIG_PATH`, then `~/.config/oxmon/config.toml`.
    #[must_use]
    pub fn resolve_path(explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return crate::utils::expand_tilde(path);
        }
        if let Some(path) = std::env::var_os(crate::CONFIG_ENV) {
            return crate::utils::expand_tilde(Path::new(&path));
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("/tmp"))
            .join(crate::DEFAULT_CONFIG_PATH)
    }
}

// Default functions for serde
fn default_interval() -> String {
    "1s".to_string()
}

const fn default_threads() -> usize {
    1
}

fn default_notifiers() -> Vec<String> {
    vec!["loginfo".to_string()]
}

fn default_level() -> String {
    "info".to_string()
}
