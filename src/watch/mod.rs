//! The directory-watch archiver.
//!
//! [`ScanLoop`] repeatedly walks the watch root, reads every regular file it
//! finds and records the content in the [`ArchiveStore`]. A full rescan per
//! cycle means nothing has to be registered when directories appear, and
//! missed changes are caught on the next pass. Unchanged files are
//! re-recorded every cycle, so provenance logs grow with each pass.
//!
//! Failures while handling one file never end a cycle, and a cycle never ends
//! the loop: only invalid settings at construction time stop the watcher
//! from running.

/// Startup and per-file error types
pub mod errors;
/// SIGINT/SIGTERM wiring for the stop handle
pub mod signals;

pub use errors::{ConfigurationError, ObservationError, RootRole};

use crate::scanner::{DirectoryWalker, WatchedFile};
use crate::storage::{ArchiveStore, Fingerprint, RecordOutcome};
use crate::utils::thread_pool::build_scan_pool;
use anyhow::{Result, bail};
use rayon::ThreadPool;
use rayon::prelude::*;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, info, info_span, warn};

/// Longest uninterrupted sleep between stop-flag checks.
const STOP_POLL_SLICE: Duration = Duration::from_millis(50);

/// Default pause between scan cycles.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Settings for one watcher.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    /// Root directory to observe
    pub watch: PathBuf,
    /// Root directory receiving archive entries
    pub archive: PathBuf,
    /// Pause between cycles
    pub interval: Duration,
    /// Stop after this many cycles; `None` runs until stopped
    pub max_cycles: Option<u64>,
    /// Worker threads for a cycle; 1 processes files sequentially
    pub threads: usize,
    /// Follow symlinks while walking
    pub follow_symlinks: bool,
    /// Patterns of relative paths to leave unobserved
    pub ignore_patterns: Vec<String>,
}

impl WatchSettings {
    /// Settings for watching `watch` into `archive` with default tuning.
    pub fn new(watch: impl Into<PathBuf>, archive: impl Into<PathBuf>) -> Self {
        Self {
            watch: watch.into(),
            archive: archive.into(),
            interval: DEFAULT_INTERVAL,
            max_cycles: None,
            threads: 1,
            follow_symlinks: false,
            ignore_patterns: Vec::new(),
        }
    }
}

/// Why a [`ScanLoop`] stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured number of cycles ran
    CyclesExhausted,
    /// [`StopHandle::request_stop`] was called (directly or by a signal)
    StopRequested,
}

/// Lifecycle of a [`ScanLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    /// Constructed, not yet run
    Idle,
    /// Executing scan cycles
    Running,
    /// Finished; terminal
    Stopped(StopReason),
}

/// Cloneable, thread-safe request to stop a running loop.
///
/// The loop finishes the observation in flight, then halts.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    /// Set once a stop has been requested
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// Creates a handle with no stop requested.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Asks the loop to stop.
    pub fn request_stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Per-cycle (or aggregated) observation counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScanCounts {
    /// Files the walker yielded and the loop attempted
    pub discovered: usize,
    /// Observations recorded in the archive
    pub archived: usize,
    /// Archive entries created
    pub entries_created: usize,
    /// Files skipped because they vanished or could not be read
    pub transient_skips: usize,
    /// Observations dropped because the archive write failed
    pub storage_failures: usize,
}

impl ScanCounts {
    /// Adds `other` into `self`.
    pub fn add(&mut self, other: &Self) {
        self.discovered += other.discovered;
        self.archived += other.archived;
        self.entries_created += other.entries_created;
        self.transient_skips += other.transient_skips;
        self.storage_failures += other.storage_failures;
    }

    /// Counts the result of one observation, logging failures.
    fn absorb(&mut self, file: &WatchedFile, result: Result<RecordOutcome, ObservationError>) {
        match result {
            Ok(outcome) => {
                self.archived += 1;
                if outcome.entry_created {
                    self.entries_created += 1;
                }
            }
            Err(e) if e.is_transient() => {
                self.transient_skips += 1;
                debug!(path = %file.relative.display(), error = %e, "skipping file this cycle");
            }
            Err(e) => {
                self.storage_failures += 1;
                warn!(path = %file.relative.display(), error = %e, "failed to archive observation");
            }
        }
    }
}

/// Outcome of one scan cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// 1-based cycle number
    pub cycle: u64,
    /// What happened during the cycle
    pub counts: ScanCounts,
}

/// Outcome of [`ScanLoop::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    /// Cycles completed (including one cut short by a stop request)
    pub cycles: u64,
    /// Counts summed over all cycles
    pub totals: ScanCounts,
    /// Why the loop stopped
    pub reason: StopReason,
}

/// Polling archiver: Idle → Running → Stopped.
pub struct ScanLoop {
    /// Validated settings with canonical roots
    settings: WatchSettings,
    /// Traversal of the watch root
    walker: DirectoryWalker,
    /// Destination archive
    store: ArchiveStore,
    /// Worker pool when more than one thread is configured
    pool: Option<ThreadPool>,
    /// External stop request
    stop: StopHandle,
    /// Current lifecycle state
    state: LoopState,
    /// Cycles run so far
    cycles_completed: u64,
}

impl ScanLoop {
    /// Validates `settings` and prepares a loop in the `Idle` state.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if either root is missing or not a
    /// directory, both roots are the same directory, the cycle budget is zero,
    /// or the worker pool cannot be built.
    pub fn new(mut settings: WatchSettings) -> Result<Self, ConfigurationError> {
        settings.watch = resolve_root(&settings.watch, RootRole::Watch)?;
        settings.archive = resolve_root(&settings.archive, RootRole::Archive)?;

        if settings.watch == settings.archive {
            return Err(ConfigurationError::Invalid(format!(
                "watch and archive roots are the same directory: {}",
                settings.watch.display()
            )));
        }
        if settings.max_cycles == Some(0) {
            return Err(ConfigurationError::Invalid(
                "maximum cycle count must be at least 1".to_string(),
            ));
        }

        let pool = if settings.threads > 1 {
            Some(
                build_scan_pool(settings.threads)
                    .map_err(|e| ConfigurationError::Invalid(e.to_string()))?,
            )
        } else if settings.threads == 1 {
            None
        } else {
            return Err(ConfigurationError::Invalid(
                "thread count must be at least 1".to_string(),
            ));
        };

        let walker = DirectoryWalker::new(&settings.watch)
            .exclude(&settings.archive)
            .ignore_patterns(settings.ignore_patterns.clone())
            .follow_symlinks(settings.follow_symlinks);

        let store = open_store(&settings.archive)?;

        Ok(Self {
            settings,
            walker,
            store,
            pool,
            stop: StopHandle::new(),
            state: LoopState::Idle,
            cycles_completed: 0,
        })
    }

    /// A handle that stops this loop from another thread or a signal handler.
    #[must_use]
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LoopState {
        self.state
    }

    /// Settings in effect, with canonical roots.
    #[must_use]
    pub const fn settings(&self) -> &WatchSettings {
        &self.settings
    }

    /// The archive this loop writes to.
    #[must_use]
    pub const fn store(&self) -> &ArchiveStore {
        &self.store
    }

    /// Cycles run so far.
    #[must_use]
    pub const fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    /// Runs cycles until the budget is spent or a stop is requested.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop is not `Idle`. Per-file failures never
    /// surface here.
    pub fn run(&mut self) -> Result<RunSummary> {
        if self.state != LoopState::Idle {
            bail!("Scan loop cannot be started from state {:?}", self.state);
        }

        self.state = LoopState::Running;
        info!(
            watch = %self.settings.watch.display(),
            archive = %self.settings.archive.display(),
            interval = %humantime::format_duration(self.settings.interval),
            max_cycles = ?self.settings.max_cycles,
            threads = self.settings.threads,
            "watch started"
        );

        let mut remaining = self.settings.max_cycles;
        let mut totals = ScanCounts::default();

        let reason = loop {
            if self.stop.is_stop_requested() {
                break StopReason::StopRequested;
            }

            let report = self.run_cycle();
            totals.add(&report.counts);

            if self.stop.is_stop_requested() {
                break StopReason::StopRequested;
            }
            if let Some(left) = remaining.as_mut() {
                *left -= 1;
                if *left == 0 {
                    break StopReason::CyclesExhausted;
                }
            }
            if !self.pause() {
                break StopReason::StopRequested;
            }
        };

        self.state = LoopState::Stopped(reason);
        info!(
            cycles = self.cycles_completed,
            archived = totals.archived,
            entries_created = totals.entries_created,
            reason = ?reason,
            "watch stopped"
        );

        Ok(RunSummary {
            cycles: self.cycles_completed,
            totals,
            reason,
        })
    }

    /// Runs exactly one scan cycle, whatever the loop state.
    ///
    /// A stop request cuts the cycle short after the observation in flight.
    pub fn run_cycle(&mut self) -> CycleReport {
        let cycle = self.cycles_completed + 1;
        let span = info_span!("scan_cycle", cycle);
        let _guard = span.enter();

        let mut counts = ScanCounts::default();
        match &self.pool {
            None => {
                for file in self.walker.walk() {
                    if self.stop.is_stop_requested() {
                        break;
                    }
                    counts.discovered += 1;
                    let result = observe(&self.store, &file);
                    counts.absorb(&file, result);
                }
            }
            Some(pool) => {
                let files: Vec<WatchedFile> = self.walker.walk().collect();
                let store = &self.store;
                let stop = &self.stop;
                let results: Vec<_> = pool.install(|| {
                    files
                        .par_iter()
                        .filter(|_| !stop.is_stop_requested())
                        .map(|file| (file, observe(store, file)))
                        .collect()
                });
                for (file, result) in results {
                    counts.discovered += 1;
                    counts.absorb(file, result);
                }
            }
        }

        self.cycles_completed = cycle;
        info!(
            discovered = counts.discovered,
            archived = counts.archived,
            entries_created = counts.entries_created,
            transient_skips = counts.transient_skips,
            storage_failures = counts.storage_failures,
            "scan cycle complete"
        );

        CycleReport { cycle, counts }
    }

    /// Sleeps for the interval; returns `false` if a stop request cut it short.
    fn pause(&self) -> bool {
        let deadline = Instant::now() + self.settings.interval;
        loop {
            if self.stop.is_stop_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep((deadline - now).min(STOP_POLL_SLICE));
        }
    }
}

/// Reads one file and records its content.
fn observe(store: &ArchiveStore, file: &WatchedFile) -> Result<RecordOutcome, ObservationError> {
    let content =
        fs::read(&file.absolute).map_err(|e| ObservationError::from_read(&file.absolute, e))?;
    let fingerprint = Fingerprint::of(&content);
    Ok(store.ensure_and_record(fingerprint, &content, &file.relative)?)
}

/// Canonicalises a configured root and checks it is a directory.
fn resolve_root(path: &Path, role: RootRole) -> Result<PathBuf, ConfigurationError> {
    let missing = |source: io::Error| ConfigurationError::MissingRoot {
        role,
        path: path.to_path_buf(),
        source,
    };

    let canonical = fs::canonicalize(path).map_err(missing)?;
    let metadata = fs::metadata(&canonical).map_err(missing)?;
    if !metadata.is_dir() {
        return Err(ConfigurationError::NotADirectory {
            role,
            path: path.to_path_buf(),
        });
    }
    Ok(canonical)
}

/// Opens the archive at an already-validated root.
fn open_store(root: &Path) -> Result<ArchiveStore, ConfigurationError> {
    ArchiveStore::open(root).map_err(|e| ConfigurationError::Invalid(format!("{e:#}")))
}
