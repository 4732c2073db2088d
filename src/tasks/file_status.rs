use super::{Task, TaskError};
use crate::watch::ConfigurationError;
use anyhow::Context;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

const SECONDS_PER_HOUR: f64 = 3600.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// What [`FileStatusChecker`] looks at and what it expects.
#[derive(Debug, Clone, Default)]
pub struct FileStatusOptions {
    /// Paths checked as given
    pub targets: Vec<PathBuf>,
    /// Glob patterns; each must match at least one path
    pub glob_targets: Vec<String>,
    /// Every target must exist
    pub live: bool,
    /// No target may exist
    pub dead: bool,
    /// Minimum size in kilobytes (1 KB = 1000 bytes)
    pub min_size_kb: Option<f64>,
    /// Maximum time since last modification, in hours
    pub max_age_hours: Option<f64>,
    /// Maximum time since last modification, in days
    pub max_age_days: Option<f64>,
}

impl FileStatusOptions {
    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.live && self.dead {
            return Err(ConfigurationError::Invalid(
                "--live and --dead cannot be combined".to_string(),
            ));
        }
        for (name, value) in [
            ("--min-size-kb", self.min_size_kb),
            ("--max-age-in-hours", self.max_age_hours),
            ("--max-age-in-days", self.max_age_days),
        ] {
            if let Some(v) = value
                && (v.is_nan() || v < 0.0)
            {
                return Err(ConfigurationError::Invalid(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
        Ok(())
    }
}

/// Checks file existence, age and size.
pub struct FileStatusChecker {
    options: FileStatusOptions,
}

impl FileStatusChecker {
    #[must_use]
    pub const fn new(options: FileStatusOptions) -> Self {
        Self { options }
    }

    /// Expands glob patterns and appends the hits to the plain targets.
    fn collect_targets(&self) -> Result<Vec<PathBuf>, TaskError> {
        let mut targets = self.options.targets.clone();
        for pattern in &self.options.glob_targets {
            let paths = glob::glob(pattern)
                .with_context(|| format!("Invalid glob pattern: {pattern}"))?;
            let hits: Vec<PathBuf> = paths.filter_map(Result::ok).collect();
            if hits.is_empty() {
                return Err(TaskError::alarm(format!("No hits for globtarget {pattern}")));
            }
            targets.extend(hits);
        }
        Ok(targets)
    }

    fn check_target(&self, target: &Path, now: SystemTime) -> Result<(), TaskError> {
        let exists = target.exists();
        if self.options.live && !exists {
            return Err(TaskError::alarm(format!(
                "Required file does not exist: {}",
                target.display()
            )));
        }
        if self.options.dead && exists {
            return Err(TaskError::alarm(format!(
                "Forbidden file present: {}",
                target.display()
            )));
        }
        if !exists {
            return Ok(());
        }

        let metadata = fs::metadata(target)
            .with_context(|| format!("Failed to stat {}", target.display()))?;

        if self.options.max_age_hours.is_some() || self.options.max_age_days.is_some() {
            let modified = metadata
                .modified()
                .with_context(|| format!("No modification time for {}", target.display()))?;
            // Future mtimes count as age zero.
            let age_secs = now
                .duration_since(modified)
                .map_or(0.0, |age| age.as_secs_f64());

            if let Some(limit) = self.options.max_age_hours {
                let hours = age_secs / SECONDS_PER_HOUR;
                if hours > limit {
                    return Err(TaskError::alarm(format!(
                        "File age {hours:.2} hours > {limit:.2} hours: {}",
                        target.display()
                    )));
                }
            }
            if let Some(limit) = self.options.max_age_days {
                let days = age_secs / SECONDS_PER_DAY;
                if days > limit {
                    return Err(TaskError::alarm(format!(
                        "File age {days:.2} days > {limit:.2} days: {}",
                        target.display()
                    )));
                }
            }
        }

        if let Some(min_kb) = self.options.min_size_kb {
            #[allow(clippy::cast_precision_loss)]
            let size_kb = metadata.len() as f64 / 1000.0;
            if size_kb < min_kb {
                return Err(TaskError::alarm(format!(
                    "File size {size_kb:.3} KB < {} KB: {}",
                    limit_text(min_kb),
                    target.display()
                )));
            }
        }

        Ok(())
    }
}

/// Renders a limit the way existing alarm texts show it: integral values keep
/// one decimal (`1.0`), others their shortest exact form (`2.5`).
fn limit_text(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl Task for FileStatusChecker {
    fn name(&self) -> &'static str {
        "filestatus"
    }

    fn execute(&self) -> Result<String, TaskError> {
        self.options.validate().map_err(anyhow::Error::new)?;
        let now = SystemTime::now();
        for target in self.collect_targets()? {
            self.check_target(&target, now)?;
        }
        Ok("Status as expected.".to_string())
    }
}
