use crate::utils::should_ignore;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// A regular file found under the watch root during one traversal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchedFile {
    /// Path relative to the watch root
    pub relative: PathBuf,
    /// Path as reached by the traversal
    pub absolute: PathBuf,
}

/// Enumerates the regular files under a root directory.
///
/// Holds no state between traversals: every call to [`DirectoryWalker::walk`]
/// lists the tree afresh, so directories created after a previous traversal
/// are picked up on the next one. Entries that disappear while the traversal
/// is underway are skipped.
#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    /// Directory to traverse
    root: PathBuf,
    /// Directories never entered, as given and in canonical form
    excluded: Vec<PathBuf>,
    /// Patterns matched against root-relative paths
    ignore_patterns: Vec<String>,
    /// Whether symlinks are followed
    follow_symlinks: bool,
}

impl DirectoryWalker {
    /// Creates a walker over `root` with no exclusions.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            excluded: Vec::new(),
            ignore_patterns: Vec::new(),
            follow_symlinks: false,
        }
    }

    /// Never descend into `dir`.
    #[must_use]
    pub fn exclude(mut self, dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        if let Ok(canonical) = fs::canonicalize(&dir)
            && canonical != dir
        {
            self.excluded.push(canonical);
        }
        self.excluded.push(dir);
        self
    }

    /// Skip files and directories whose relative path matches any of `patterns`.
    #[must_use]
    pub fn ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Follow symbolic links while traversing.
    #[must_use]
    pub const fn follow_symlinks(mut self, follow: bool) -> Self {
        self.follow_symlinks = follow;
        self
    }

    /// Root of the traversal.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily traverses the tree, yielding every regular file reachable now.
    pub fn walk(&self) -> impl Iterator<Item = WatchedFile> + '_ {
        WalkDir::new(&self.root)
            .follow_links(self.follow_symlinks)
            .into_iter()
            .filter_entry(move |entry| self.should_enter(entry))
            .filter_map(|result| match result {
                Ok(entry) => Some(entry),
                Err(e) => {
                    report_walk_error(&e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| {
                let relative = entry.path().strip_prefix(&self.root).ok()?.to_path_buf();
                Some(WatchedFile {
                    relative,
                    absolute: entry.into_path(),
                })
            })
    }

    /// Decides whether an entry is visited (and, for directories, descended into).
    fn should_enter(&self, entry: &DirEntry) -> bool {
        if entry.depth() == 0 {
            return true;
        }

        let path = entry.path();
        if entry.file_type().is_dir() && self.is_excluded(path) {
            return false;
        }

        if self.ignore_patterns.is_empty() {
            return true;
        }
        !path
            .strip_prefix(&self.root)
            .is_ok_and(|relative| should_ignore(relative, &self.ignore_patterns))
    }
}

impl DirectoryWalker {
    /// Whether `dir` is an excluded directory. When links are followed the
    /// same directory can be reached under another name, so the resolved
    /// path is compared as well.
    fn is_excluded(&self, dir: &Path) -> bool {
        if self.excluded.iter().any(|excluded| excluded == dir) {
            return true;
        }
        self.follow_symlinks
            && fs::canonicalize(dir)
                .is_ok_and(|resolved| self.excluded.iter().any(|excluded| *excluded == resolved))
    }
}

/// Logs a traversal error; vanished entries are routine, anything else is worth a warning.
fn report_walk_error(err: &walkdir::Error) {
    let path = err.path().map(|p| p.display().to_string());
    match err.io_error().map(io::Error::kind) {
        Some(io::ErrorKind::NotFound) if err.depth() > 0 => {
            debug!(path = ?path, "entry vanished during traversal");
        }
        _ => warn!(path = ?path, error = %err, "skipping unreadable entry"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn relative_paths(walker: &DirectoryWalker) -> BTreeSet<PathBuf> {
        walker.walk().map(|f| f.relative).collect()
    }

    #[test]
    fn test_finds_nested_files() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("a/b")).unwrap();
        fs::write(root.join("top.txt"), "top").unwrap();
        fs::write(root.join("a/b/deep.txt"), "deep").unwrap();

        let walker = DirectoryWalker::new(root);
        let found = relative_paths(&walker);

        let expected: BTreeSet<PathBuf> =
            [PathBuf::from("top.txt"), PathBuf::from("a/b/deep.txt")].into();
        assert_eq!(found, expected);
    }

    #[test]
    fn test_absolute_path_points_at_file() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("f.txt"), "content").unwrap();

        let walker = DirectoryWalker::new(temp.path());
        let file = walker.walk().next().unwrap();
        assert_eq!(file.absolute, temp.path().join("f.txt"));
        assert_eq!(fs::read_to_string(&file.absolute).unwrap(), "content");
    }

    #[test]
    fn test_each_walk_sees_new_directories() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let walker = DirectoryWalker::new(root);
        assert_eq!(walker.walk().count(), 0);

        fs::create_dir(root.join("later")).unwrap();
        fs::write(root.join("later/file.txt"), "x").unwrap();

        assert!(relative_paths(&walker).contains(Path::new("later/file.txt")));
    }

    #[test]
    fn test_excluded_directory_not_entered() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let archive = root.join("archive");
        fs::create_dir(&archive).unwrap();
        fs::write(archive.join("blob"), "stored").unwrap();
        fs::write(root.join("watched.txt"), "w").unwrap();

        let walker = DirectoryWalker::new(root).exclude(&archive);
        let found = relative_paths(&walker);

        assert_eq!(found.len(), 1);
        assert!(found.contains(Path::new("watched.txt")));
    }

    #[test]
    fn test_ignore_patterns() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/HEAD"), "ref").unwrap();
        fs::write(root.join("keep.txt"), "k").unwrap();
        fs::write(root.join("edit.swp"), "s").unwrap();

        let walker = DirectoryWalker::new(root)
            .ignore_patterns(vec![".git".to_string(), "*.swp".to_string()]);
        let found = relative_paths(&walker);

        assert_eq!(found, [PathBuf::from("keep.txt")].into());
    }

    #[test]
    fn test_missing_root_yields_nothing() {
        let temp = TempDir::new().unwrap();
        let walker = DirectoryWalker::new(temp.path().join("gone"));
        assert_eq!(walker.walk().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_skipped_unless_followed() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("target.txt"), "t").unwrap();
        std::os::unix::fs::symlink(outside.path().join("target.txt"), root.join("link.txt"))
            .unwrap();

        assert_eq!(DirectoryWalker::new(root).walk().count(), 0);
        assert_eq!(
            DirectoryWalker::new(root)
                .follow_symlinks(true)
                .walk()
                .count(),
            1
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_excluded_directory_not_entered_through_link() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        let outside = TempDir::new().unwrap();
        let archive = outside.path().join("archive");
        fs::create_dir_all(archive.join("entry")).unwrap();
        fs::write(archive.join("entry/names.txt"), "log").unwrap();
        fs::write(root.join("watched.txt"), "w").unwrap();

        // One link straight at the archive, one at its parent.
        std::os::unix::fs::symlink(&archive, root.join("direct")).unwrap();
        std::os::unix::fs::symlink(outside.path(), root.join("parent")).unwrap();

        let walker = DirectoryWalker::new(root)
            .follow_symlinks(true)
            .exclude(&archive);

        assert_eq!(relative_paths(&walker), [PathBuf::from("watched.txt")].into());
    }
}
