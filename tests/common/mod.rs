#![allow(dead_code)]

use anyhow::Result;
use oxmon::storage::{ArchiveStore, Fingerprint, ProvenanceRecord};
use oxmon::watch::{ScanLoop, WatchSettings};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;

/// A watch root and an archive root in separate temporary directories
pub struct WatchFixture {
    pub watch_dir: TempDir,
    pub archive_dir: TempDir,
}

impl WatchFixture {
    pub fn new() -> Result<Self> {
        Ok(Self {
            watch_dir: TempDir::new()?,
            archive_dir: TempDir::new()?,
        })
    }

    pub fn watch(&self) -> &Path {
        self.watch_dir.path()
    }

    pub fn archive(&self) -> &Path {
        self.archive_dir.path()
    }

    /// Writes `content` at `relative` under the watch root, creating parents
    pub fn write(&self, relative: &str, content: &[u8]) -> Result<PathBuf> {
        let path = self.watch().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(path)
    }

    pub fn remove(&self, relative: &str) -> Result<()> {
        fs::remove_file(self.watch().join(relative))?;
        Ok(())
    }

    /// Settings with no pause between cycles
    pub fn settings(&self, cycles: u64) -> WatchSettings {
        WatchSettings {
            interval: Duration::ZERO,
            max_cycles: Some(cycles),
            ..WatchSettings::new(self.watch(), self.archive())
        }
    }

    /// Runs `cycles` bounded cycles to completion
    pub fn run_cycles(&self, cycles: u64) -> Result<()> {
        ScanLoop::new(self.settings(cycles))?.run()?;
        Ok(())
    }

    pub fn store(&self) -> Result<ArchiveStore> {
        ArchiveStore::open(self.archive())
    }

    pub fn records_for(&self, content: &[u8]) -> Result<Vec<ProvenanceRecord>> {
        self.store()?.provenance(Fingerprint::of(content))
    }

    pub fn record_paths(&self, content: &[u8]) -> Result<Vec<String>> {
        Ok(self
            .records_for(content)?
            .into_iter()
            .map(|r| r.path)
            .collect())
    }
}
