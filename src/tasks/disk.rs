use super::{Task, TaskError};
use crate::watch::ConfigurationError;
use anyhow::Context;
use std::path::PathBuf;

/// Alarms when the filesystem holding a path is fuller than a limit.
pub struct DiskChecker {
    path: PathBuf,
    max_used_pct: f64,
}

impl DiskChecker {
    pub fn new(path: impl Into<PathBuf>, max_used_pct: f64) -> Self {
        Self {
            path: path.into(),
            max_used_pct,
        }
    }
}

/// Percentage of `total` not available to unprivileged users.
#[allow(clippy::cast_precision_loss)]
fn used_percent(total: u64, available: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let used = total.saturating_sub(available);
    used as f64 * 100.0 / total as f64
}

impl Task for DiskChecker {
    fn name(&self) -> &'static str {
        "disk"
    }

    fn execute(&self) -> Result<String, TaskError> {
        if !(0.0..=100.0).contains(&self.max_used_pct) {
            return Err(anyhow::Error::new(ConfigurationError::Invalid(format!(
                "--max-used-pct must be between 0 and 100, got {}",
                self.max_used_pct
            )))
            .into());
        }

        let total = fs4::total_space(&self.path)
            .with_context(|| format!("Failed to read filesystem size for {}", self.path.display()))?;
        let available = fs4::available_space(&self.path).with_context(|| {
            format!("Failed to read available space for {}", self.path.display())
        })?;

        let used = used_percent(total, available);
        if used > self.max_used_pct {
            return Err(TaskError::alarm(format!(
                "Disk usage {used:.2}% > {:.2}% for {}",
                self.max_used_pct,
                self.path.display()
            )));
        }

        Ok(format!(
            "Disk usage {used:.2}% within {:.2}% for {}",
            self.max_used_pct,
            self.path.display()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    #[rstest]
    #[case(100, 100, 0.0)]
    #[case(100, 25, 75.0)]
    #[case(100, 0, 100.0)]
    #[case(0, 0, 0.0)]
    fn test_used_percent(#[case] total: u64, #[case] available: u64, #[case] expected: f64) {
        assert!((used_percent(total, available) - expected).abs() < f64::EPSILON);
    }

    #[test]
    fn test_generous_limit_passes() {
        let dir = TempDir::new().unwrap();
        let status = DiskChecker::new(dir.path(), 100.0).execute().unwrap();
        assert!(status.starts_with("Disk usage "));
    }

    #[test]
    fn test_out_of_range_limit_fails() {
        let dir = TempDir::new().unwrap();
        for pct in [-1.0, 101.0, f64::NAN] {
            let err = DiskChecker::new(dir.path(), pct).execute().unwrap_err();
            assert!(err.is_configuration_error());
        }
    }

    #[test]
    fn test_missing_path_fails() {
        let dir = TempDir::new().unwrap();
        let err = DiskChecker::new(dir.path().join("absent"), 50.0)
            .execute()
            .unwrap_err();
        assert!(matches!(err, TaskError::Failed(_)));
    }
}
