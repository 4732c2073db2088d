//! Filesystem traversal of the watched tree.

/// Stateless, deletion-tolerant directory traversal.
pub mod walker;

pub use walker::{DirectoryWalker, WatchedFile};
