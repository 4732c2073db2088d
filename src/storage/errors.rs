use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Which step of recording an observation failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageStep {
    /// Creating the entry directory
    CreateEntry,
    /// Writing the blob into place
    WriteBlob,
    /// Appending to the provenance log
    AppendProvenance,
    /// Reading back archive contents
    Read,
}

impl StorageStep {
    /// Short description used in messages
    const fn as_str(self) -> &'static str {
        match self {
            Self::CreateEntry => "create archive entry",
            Self::WriteBlob => "write blob",
            Self::AppendProvenance => "append provenance record",
            Self::Read => "read archive",
        }
    }
}

/// An I/O failure while writing to or reading from the archive.
///
/// Raised for a single observation; the scan loop logs it and moves on.
#[derive(Debug)]
pub struct StorageError {
    /// Step that failed
    step: StorageStep,
    /// Path the failing operation targeted
    path: PathBuf,
    /// Underlying I/O error
    source: io::Error,
}

impl StorageError {
    /// Wraps an I/O error for `step` on `path`.
    pub fn new(step: StorageStep, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self {
            step,
            path: path.into(),
            source,
        }
    }

    /// Step that failed.
    #[must_use]
    pub const fn step(&self) -> StorageStep {
        self.step
    }

    /// Path the failing operation targeted.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Kind of the underlying I/O error.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        self.source.kind()
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "failed to {} at {}: {}",
            self.step.as_str(),
            self.path.display(),
            self.source
        )
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Result alias for archive operations.
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_names_step_and_path() {
        let err = StorageError::new(
            StorageStep::WriteBlob,
            "/archive/abc/main.data",
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("write blob"));
        assert!(msg.contains("/archive/abc/main.data"));
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert_eq!(err.step(), StorageStep::WriteBlob);
    }

    #[test]
    fn test_source_is_io_error() {
        use std::error::Error;

        let err = StorageError::new(
            StorageStep::CreateEntry,
            "/archive",
            io::Error::other("disk full"),
        );
        assert!(err.source().is_some());
    }
}
