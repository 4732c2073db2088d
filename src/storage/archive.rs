//! On-disk content-addressed archive.
//!
//! Every distinct content fingerprint owns one directory under the archive
//! root holding the blob (`main.data`) and an append-only provenance log
//! (`names.txt`). Entries are created lazily and never removed.

use super::errors::{StorageError, StorageResult, StorageStep};
use super::fingerprint::{Fingerprint, FingerprintHasher};
use anyhow::{Context, Result, bail};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use fs4::fs_std::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::debug;

/// File name of the stored blob inside an entry directory.
pub const BLOB_FILE: &str = "main.data";

/// File name of the provenance log inside an entry directory.
pub const PROVENANCE_FILE: &str = "names.txt";

/// One line of a provenance log: which relative path produced the content, and when.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvenanceRecord {
    /// Time the observation was recorded
    pub observed_at: DateTime<Utc>,
    /// Path relative to the watch root, `/`-separated
    pub path: String,
}

impl ProvenanceRecord {
    /// Creates a record for `observed_path` stamped with the current time,
    /// truncated to the millisecond precision of the log line.
    #[must_use]
    pub fn now(observed_path: &Path) -> Self {
        Self {
            observed_at: Utc::now().trunc_subsecs(3),
            path: portable_path(observed_path),
        }
    }

    /// Renders the record as a single log line, including the trailing newline.
    #[must_use]
    pub fn to_line(&self) -> String {
        format!(
            "{} {}\n",
            self.observed_at.to_rfc3339_opts(SecondsFormat::Millis, true),
            escape_path(&self.path)
        )
    }

    /// Parses a line produced by [`ProvenanceRecord::to_line`].
    ///
    /// # Errors
    ///
    /// Returns an error if the line has no timestamp or the timestamp is not RFC 3339.
    pub fn parse_line(line: &str) -> Result<Self> {
        let line = line.strip_suffix('\n').unwrap_or(line);
        let Some((stamp, path)) = line.split_once(' ') else {
            bail!("Malformed provenance record: '{line}'");
        };
        let observed_at = DateTime::parse_from_rfc3339(stamp)
            .with_context(|| format!("Invalid timestamp in provenance record: '{stamp}'"))?
            .with_timezone(&Utc);

        Ok(Self {
            observed_at,
            path: unescape_path(path),
        })
    }
}

/// What [`ArchiveStore::ensure_and_record`] had to do for an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordOutcome {
    /// The entry directory did not exist before this call
    pub entry_created: bool,
    /// The blob was (re)written by this call
    pub blob_written: bool,
}

/// Result of re-hashing a stored blob.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryHealth {
    /// Blob content hashes to the entry name
    Intact,
    /// Entry directory exists but holds no blob
    MissingBlob,
    /// Blob content hashes to something else (e.g. truncated by a crash)
    Mismatch {
        /// Fingerprint of the bytes actually on disk
        actual: Fingerprint,
    },
}

/// Size and record count of one entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    /// Entry identity
    pub fingerprint: Fingerprint,
    /// Size of the stored blob, 0 when missing
    pub blob_size: u64,
    /// Number of provenance records
    pub records: usize,
}

/// Handle to an archive root directory.
///
/// Cheap to clone; holds no open files. All write operations are safe to call
/// concurrently from several threads or processes for the same fingerprint.
#[derive(Debug, Clone)]
pub struct ArchiveStore {
    /// Archive root directory
    root: PathBuf,
}

impl ArchiveStore {
    /// Opens an existing archive root.
    ///
    /// # Errors
    ///
    /// Returns an error if `root` does not exist or is not a directory.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let metadata = fs::metadata(&root)
            .with_context(|| format!("Archive root not accessible: {}", root.display()))?;
        if !metadata.is_dir() {
            bail!("Archive root is not a directory: {}", root.display());
        }
        Ok(Self { root })
    }

    /// Archive root directory.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory of the entry for `fingerprint`.
    #[must_use]
    pub fn entry_dir(&self, fingerprint: Fingerprint) -> PathBuf {
        self.root.join(fingerprint.to_hex())
    }

    /// Path of the blob for `fingerprint`.
    #[must_use]
    pub fn blob_path(&self, fingerprint: Fingerprint) -> PathBuf {
        self.entry_dir(fingerprint).join(BLOB_FILE)
    }

    /// Path of the provenance log for `fingerprint`.
    #[must_use]
    pub fn provenance_path(&self, fingerprint: Fingerprint) -> PathBuf {
        self.entry_dir(fingerprint).join(PROVENANCE_FILE)
    }

    /// Whether an entry directory exists for `fingerprint`.
    #[must_use]
    pub fn contains(&self, fingerprint: Fingerprint) -> bool {
        self.entry_dir(fingerprint).is_dir()
    }

    /// Records one observation of `content` under `observed_path`.
    ///
    /// Creates the entry if absent, makes sure the blob is on disk, then appends
    /// one provenance record. The blob is complete before the record is written.
    ///
    /// # Errors
    ///
    /// Returns a [`StorageError`] if any of the three steps fails.
    pub fn ensure_and_record(
        &self,
        fingerprint: Fingerprint,
        content: &[u8],
        observed_path: &Path,
    ) -> StorageResult<RecordOutcome> {
        let entry_dir = self.entry_dir(fingerprint);
        let entry_created = Self::ensure_entry(&entry_dir)?;
        let blob_written = Self::write_blob(&entry_dir, content)?;
        Self::append_provenance(&entry_dir, &ProvenanceRecord::now(observed_path))?;

        debug!(
            fingerprint = %fingerprint,
            path = %observed_path.display(),
            entry_created,
            blob_written,
            "recorded observation"
        );

        Ok(RecordOutcome {
            entry_created,
            blob_written,
        })
    }

    /// Creates the entry directory; an existing directory counts as success.
    fn ensure_entry(entry_dir: &Path) -> StorageResult<bool> {
        match fs::create_dir(entry_dir) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && entry_dir.is_dir() => Ok(false),
            Err(e) => Err(StorageError::new(StorageStep::CreateEntry, entry_dir, e)),
        }
    }

    /// Writes the blob through a temporary file renamed into place.
    ///
    /// A blob already present with the expected length is left alone.
    fn write_blob(entry_dir: &Path, content: &[u8]) -> StorageResult<bool> {
        let blob_path = entry_dir.join(BLOB_FILE);
        if let Ok(metadata) = fs::metadata(&blob_path)
            && metadata.is_file()
            && metadata.len() == content.len() as u64
        {
            return Ok(false);
        }

        let write_err = |e: io::Error| StorageError::new(StorageStep::WriteBlob, &blob_path, e);

        let mut temp = tempfile::Builder::new()
            .prefix(".main.data.")
            .tempfile_in(entry_dir)
            .map_err(write_err)?;
        temp.write_all(content).map_err(write_err)?;
        temp.as_file().sync_all().map_err(write_err)?;
        temp.persist(&blob_path).map_err(|e| write_err(e.error))?;

        Ok(true)
    }

    /// Appends one record under an exclusive lock so concurrent writers never interleave.
    fn append_provenance(entry_dir: &Path, record: &ProvenanceRecord) -> StorageResult<()> {
        let log_path = entry_dir.join(PROVENANCE_FILE);
        let append_err =
            |e: io::Error| StorageError::new(StorageStep::AppendProvenance, &log_path, e);

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(append_err)?;

        file.lock_exclusive().map_err(append_err)?;
        let written = file.write_all(record.to_line().as_bytes());
        let unlocked = FileExt::unlock(&file);

        written.map_err(append_err)?;
        unlocked.map_err(append_err)
    }

    /// Reads the stored blob for `fingerprint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry or its blob does not exist or cannot be read.
    pub fn read_blob(&self, fingerprint: Fingerprint) -> Result<Vec<u8>> {
        let path = self.blob_path(fingerprint);
        fs::read(&path).with_context(|| format!("Failed to read blob: {}", path.display()))
    }

    /// Reads the provenance records of `fingerprint` in append order.
    ///
    /// A missing log yields no records. Lines that fail to parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the log exists but cannot be read.
    pub fn provenance(&self, fingerprint: Fingerprint) -> Result<Vec<ProvenanceRecord>> {
        let path = self.provenance_path(fingerprint);
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(StorageError::new(StorageStep::Read, &path, e))
                    .context("Failed to open provenance log");
            }
        };

        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line
                .with_context(|| format!("Failed to read provenance log: {}", path.display()))?;
            if line.is_empty() {
                continue;
            }
            match ProvenanceRecord::parse_line(&line) {
                Ok(record) => records.push(record),
                Err(e) => debug!(path = %path.display(), error = %e, "skipping malformed record"),
            }
        }
        Ok(records)
    }

    /// Lists every entry in the archive, sorted by fingerprint.
    ///
    /// Directories whose names are not fingerprints are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the archive root cannot be listed.
    pub fn entries(&self) -> Result<Vec<Fingerprint>> {
        let listing = fs::read_dir(&self.root)
            .with_context(|| format!("Failed to list archive root: {}", self.root.display()))?;

        let mut fingerprints: Vec<Fingerprint> = listing
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter_map(|entry| entry.file_name().to_str()?.parse().ok())
            .collect();
        fingerprints.sort_unstable();
        Ok(fingerprints)
    }

    /// Blob size and record count for `fingerprint`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provenance log cannot be read.
    pub fn summarize(&self, fingerprint: Fingerprint) -> Result<EntrySummary> {
        let blob_size = fs::metadata(self.blob_path(fingerprint)).map_or(0, |m| m.len());
        let records = self.provenance(fingerprint)?.len();
        Ok(EntrySummary {
            fingerprint,
            blob_size,
            records,
        })
    }

    /// Re-hashes the stored blob and compares it to the entry name.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob exists but cannot be read.
    pub fn verify_entry(&self, fingerprint: Fingerprint) -> Result<EntryHealth> {
        let path = self.blob_path(fingerprint);
        let mut file = match File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(EntryHealth::MissingBlob),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open blob: {}", path.display()));
            }
        };

        let mut hasher = FingerprintHasher::new();
        let mut buffer = vec![0u8; 65536];
        loop {
            let bytes_read = file
                .read(&mut buffer)
                .with_context(|| format!("Failed to read blob: {}", path.display()))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        let actual = hasher.finish();
        if actual == fingerprint {
            Ok(EntryHealth::Intact)
        } else {
            Ok(EntryHealth::Mismatch { actual })
        }
    }
}

/// Joins the normal components of `path` with `/`.
fn portable_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

/// Escapes backslashes and line breaks so a record stays on one line.
fn escape_path(path: &str) -> String {
    let mut escaped = String::with_capacity(path.len());
    for ch in path.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Inverse of [`escape_path`].
fn unescape_path(escaped: &str) -> String {
    let mut path = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            path.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => path.push('\n'),
            Some('r') => path.push('\r'),
            Some(other) => path.push(other),
            None => path.push('\\'),
        }
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store() -> (tempfile::TempDir, ArchiveStore) {
        let dir = tempdir().unwrap();
        let store = ArchiveStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_rejects_missing_root() {
        let dir = tempdir().unwrap();
        assert!(ArchiveStore::open(dir.path().join("missing")).is_err());

        let file = dir.path().join("file");
        fs::write(&file, "x").unwrap();
        assert!(ArchiveStore::open(&file).is_err());
    }

    #[test]
    fn test_first_record_creates_entry() -> Result<()> {
        let (_dir, store) = store();
        let fp = Fingerprint::of(b"test.txt");

        let outcome = store.ensure_and_record(fp, b"test.txt", Path::new("test.txt"))?;
        assert!(outcome.entry_created);
        assert!(outcome.blob_written);

        assert_eq!(store.read_blob(fp)?, b"test.txt");
        let records = store.provenance(fp)?;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].path, "test.txt");
        Ok(())
    }

    #[test]
    fn test_repeat_record_appends_without_rewriting() -> Result<()> {
        let (_dir, store) = store();
        let fp = Fingerprint::of(b"same");

        store.ensure_and_record(fp, b"same", Path::new("a.txt"))?;
        let outcome = store.ensure_and_record(fp, b"same", Path::new("sub/b.txt"))?;
        assert!(!outcome.entry_created);
        assert!(!outcome.blob_written);

        let paths: Vec<String> = store.provenance(fp)?.into_iter().map(|r| r.path).collect();
        assert_eq!(paths, vec!["a.txt", "sub/b.txt"]);
        Ok(())
    }

    #[test]
    fn test_damaged_blob_is_rewritten() -> Result<()> {
        let (_dir, store) = store();
        let fp = Fingerprint::of(b"full content");

        store.ensure_and_record(fp, b"full content", Path::new("f"))?;
        fs::write(store.blob_path(fp), b"full")?;
        assert_eq!(
            store.verify_entry(fp)?,
            EntryHealth::Mismatch {
                actual: Fingerprint::of(b"full")
            }
        );

        let outcome = store.ensure_and_record(fp, b"full content", Path::new("f"))?;
        assert!(outcome.blob_written);
        assert_eq!(store.verify_entry(fp)?, EntryHealth::Intact);
        Ok(())
    }

    #[test]
    fn test_entry_directory_recreated_after_removal() -> Result<()> {
        let (_dir, store) = store();
        let fp = Fingerprint::of(b"again");

        store.ensure_and_record(fp, b"again", Path::new("x"))?;
        fs::remove_dir_all(store.entry_dir(fp))?;

        let outcome = store.ensure_and_record(fp, b"again", Path::new("x"))?;
        assert!(outcome.entry_created);
        assert_eq!(store.provenance(fp)?.len(), 1);
        Ok(())
    }

    #[test]
    fn test_missing_root_is_storage_error() {
        let (dir, store) = store();
        let missing = ArchiveStore {
            root: dir.path().join("gone"),
        };
        let err = missing
            .ensure_and_record(Fingerprint::of(b"x"), b"x", Path::new("x"))
            .unwrap_err();
        assert_eq!(err.step(), StorageStep::CreateEntry);
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        drop(store);
    }

    #[test]
    fn test_entries_ignores_foreign_directories() -> Result<()> {
        let (dir, store) = store();
        fs::create_dir(dir.path().join("not-a-fingerprint"))?;
        fs::write(dir.path().join("stray.txt"), "x")?;

        let a = Fingerprint::of(b"a");
        let b = Fingerprint::of(b"b");
        store.ensure_and_record(a, b"a", Path::new("a"))?;
        store.ensure_and_record(b, b"b", Path::new("b"))?;

        let mut expected = vec![a, b];
        expected.sort_unstable();
        assert_eq!(store.entries()?, expected);
        Ok(())
    }

    #[test]
    fn test_summarize_and_missing_blob() -> Result<()> {
        let (_dir, store) = store();
        let fp = Fingerprint::of(b"12345");
        store.ensure_and_record(fp, b"12345", Path::new("n"))?;
        store.ensure_and_record(fp, b"12345", Path::new("n"))?;

        let summary = store.summarize(fp)?;
        assert_eq!(summary.blob_size, 5);
        assert_eq!(summary.records, 2);

        fs::remove_file(store.blob_path(fp))?;
        assert_eq!(store.verify_entry(fp)?, EntryHealth::MissingBlob);
        Ok(())
    }

    #[test]
    fn test_record_line_round_trip_with_awkward_names() -> Result<()> {
        let record = ProvenanceRecord {
            observed_at: Utc::now(),
            path: "dir with space/line\nbreak\\back".to_string(),
        };
        let line = record.to_line();
        assert_eq!(line.matches('\n').count(), 1);

        let parsed = ProvenanceRecord::parse_line(&line)?;
        assert_eq!(parsed.path, record.path);
        assert_eq!(
            parsed.observed_at.timestamp_millis(),
            record.observed_at.timestamp_millis()
        );
        Ok(())
    }

    #[test]
    fn test_parse_line_rejects_garbage() {
        assert!(ProvenanceRecord::parse_line("no-timestamp-here").is_err());
        assert!(ProvenanceRecord::parse_line("yesterday a.txt").is_err());
    }

    #[test]
    fn test_portable_path_uses_forward_slashes() {
        let path: PathBuf = ["sub", "deeper", "file.txt"].iter().collect();
        assert_eq!(portable_path(&path), "sub/deeper/file.txt");
    }
}
