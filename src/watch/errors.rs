use crate::storage::StorageError;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Which configured root a [`ConfigurationError`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootRole {
    /// Directory being observed
    Watch,
    /// Directory receiving archive entries
    Archive,
}

impl fmt::Display for RootRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Watch => f.write_str("watch"),
            Self::Archive => f.write_str("archive"),
        }
    }
}

/// Invalid watcher settings detected at startup; the loop never starts.
#[derive(Debug)]
pub enum ConfigurationError {
    /// A root directory does not exist or cannot be resolved
    MissingRoot {
        /// Which root
        role: RootRole,
        /// Path as configured
        path: PathBuf,
        /// Resolution failure
        source: io::Error,
    },
    /// A root exists but is not a directory
    NotADirectory {
        /// Which root
        role: RootRole,
        /// Path as configured
        path: PathBuf,
    },
    /// Any other unusable setting
    Invalid(String),
}

impl fmt::Display for ConfigurationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRoot { role, path, source } => {
                write!(f, "{role} root {} is not accessible: {source}", path.display())
            }
            Self::NotADirectory { role, path } => {
                write!(f, "{role} root {} is not a directory", path.display())
            }
            Self::Invalid(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigurationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MissingRoot { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Why a single discovered file could not be archived this cycle.
#[derive(Debug)]
pub enum ObservationError {
    /// The file disappeared between listing and reading
    Vanished {
        /// Absolute path of the file
        path: PathBuf,
    },
    /// The file exists but could not be read right now
    Unreadable {
        /// Absolute path of the file
        path: PathBuf,
        /// Read failure
        source: io::Error,
    },
    /// The archive could not record the observation
    Storage(StorageError),
}

impl ObservationError {
    /// Classifies a read failure of `path`.
    pub fn from_read(path: &Path, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            Self::Vanished {
                path: path.to_path_buf(),
            }
        } else {
            Self::Unreadable {
                path: path.to_path_buf(),
                source,
            }
        }
    }

    /// Whether the failure is a routine race with the watched tree.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Vanished { .. } | Self::Unreadable { .. })
    }
}

impl fmt::Display for ObservationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Vanished { path } => write!(f, "{} vanished before it was read", path.display()),
            Self::Unreadable { path, source } => {
                write!(f, "{} could not be read: {source}", path.display())
            }
            Self::Storage(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for ObservationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Vanished { .. } => None,
            Self::Unreadable { source, .. } => Some(source),
            Self::Storage(e) => Some(e),
        }
    }
}

impl From<StorageError> for ObservationError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}
