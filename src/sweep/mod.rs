//! Sweep orchestration.
//!
//! # Overview
//!
//! A [`Sweeper`] runs one cleaning pass over the target folder:
//!
//! 1. **Count** the entries (fatal if the folder cannot be listed)
//! 2. **Scan** them in listing order:
//!    - subdirectories other than the app folder are queued for removal
//!    - files are answered from the cache, or read and classified and the
//!      verdict cached
//!    - checkpoints periodically save the cache without pruning
//!    - the shutdown coordinator is polled before every entry
//! 3. **Delete** queued directories, then queued files, best effort
//! 4. **Finalize**: save the cache pruned to kept files and flush the logs
//!
//! Per-file failures are counted and written to the error log; the run goes
//! on. An interrupt saves what has been decided so far and returns
//! [`SweepError::Interrupted`].
//!
//! # Example
//!
//! ```no_run
//! use pixel_mage::config::{Config, Settings};
//! use pixel_mage::sweep::Sweeper;
//!
//! let config = Config::from_settings(Settings::default()).unwrap();
//! let mut sweeper = Sweeper::from_config(&config);
//! let report = sweeper.run().unwrap();
//! println!("{} processed, {} from cache", report.counters.processed, report.counters.skipped);
//! ```

pub mod checkpoint;
mod context;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use crate::actions::{
    BatchDeleteResult, DeleteConfig, DeleteError, DeleteObserver, DeletionCandidate,
    DeletionExecutor,
};
use crate::cache::{CacheError, VerdictCache};
use crate::classifier::{Classifier, ClassifyError, ImageProbe, Verdict};
use crate::config::{Config, DEFAULT_APP_FOLDER};
use crate::error_log::ErrorLog;
use crate::logging::{format_elapsed, percentage, RunLog};
use crate::progress::ProgressCallback;
use crate::scanner::{EntryKind, ScanEntry, ScanError, Walker};
use crate::signal::ShutdownCoordinator;

pub use checkpoint::{CheckpointClock, CheckpointPolicy, DEFAULT_CHECKPOINT_INTERVAL};
pub use context::RunCounters;

use context::RunContext;

/// Errors that end a sweep.
#[derive(Debug, Error)]
pub enum SweepError {
    /// The target folder could not be listed.
    #[error("Cannot list target folder: {0}")]
    ListDirectory(#[from] ScanError),

    /// The cache could not be saved.
    #[error("Failed to save cache: {0}")]
    Cache(#[from] CacheError),

    /// A termination signal stopped the run.
    #[error("Interrupted by signal")]
    Interrupted,
}

/// A single file that could not be handled.
#[derive(Debug, Error)]
pub enum FileError {
    /// Metadata could not be read.
    #[error("cannot stat {path}: {source}")]
    Stat {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Content could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },

    /// Content could not be classified.
    #[error("cannot classify {path}: {source}")]
    Classify {
        /// File path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: ClassifyError,
    },

    /// The entry could not be inspected while listing.
    #[error(transparent)]
    Walk(ScanError),
}

impl FileError {
    /// Short name of the failure class, used in the error log.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Stat { .. } => "Stat",
            Self::Read { .. } => "Read",
            Self::Classify { .. } => "Classify",
            Self::Walk(_) => "Walk",
        }
    }
}

/// Outcome of a finished sweep.
#[derive(Debug, Clone)]
pub struct SweepReport {
    /// Final counters.
    pub counters: RunCounters,
    /// Entries counted before the scan.
    pub total_entries: usize,
    /// Directories queued for removal.
    pub directories: Vec<DeletionCandidate>,
    /// Files queued for removal.
    pub files: Vec<DeletionCandidate>,
    /// What the deletion phase achieved.
    pub deletions: BatchDeleteResult,
    /// Error log file, when errors were written to one.
    pub error_log: Option<PathBuf>,
    /// Wall time of the run.
    pub elapsed: Duration,
}

impl SweepReport {
    /// One-line outcome of the run, independent of the run log settings.
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "Processed {} new files, skipped {} cached files, {} errors; {}",
            self.counters.processed,
            self.counters.skipped,
            self.counters.error_count,
            self.deletions.summary()
        )
    }
}

/// Runs one cleaning pass over a folder.
pub struct Sweeper {
    root: PathBuf,
    app_folder: String,
    checkpoint: CheckpointPolicy,
    executor: DeletionExecutor,
    classifier: Classifier,
    cache: VerdictCache,
    run_log: RunLog,
    error_log: ErrorLog,
    shutdown: Option<ShutdownCoordinator>,
    progress: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for Sweeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sweeper")
            .field("root", &self.root)
            .field("app_folder", &self.app_folder)
            .field("checkpoint", &self.checkpoint)
            .field("classifier", &self.classifier)
            .field("cache", &self.cache.path())
            .finish_non_exhaustive()
    }
}

impl Sweeper {
    /// Create a sweeper with silent logs, permanent deletion and no
    /// shutdown coordinator.
    #[must_use]
    pub fn new(root: &Path, classifier: Classifier, cache: VerdictCache) -> Self {
        Self {
            root: root.to_path_buf(),
            app_folder: DEFAULT_APP_FOLDER.to_string(),
            checkpoint: CheckpointPolicy::default(),
            executor: DeletionExecutor::new(root, DeleteConfig::permanent()),
            classifier,
            cache,
            run_log: RunLog::disabled(),
            error_log: ErrorLog::disabled(),
            shutdown: None,
            progress: None,
        }
    }

    /// Create a sweeper for a validated configuration.
    ///
    /// The cache is loaded here; logs are named after the current time.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let started = Utc::now();
        let app_dir = config.app_dir();
        let classifier = Classifier::new(
            config.rules.clone(),
            Box::new(config.digest),
            Box::new(ImageProbe),
        );
        log::debug!("Classifying with {:?}", classifier);

        Self::new(
            &config.target,
            classifier,
            VerdictCache::open(config.cache_path.clone()),
        )
        .with_app_folder(&config.app_folder)
        .with_checkpoint_policy(CheckpointPolicy::new(config.checkpoint_interval))
        .with_delete_config(config.delete.clone())
        .with_run_log(RunLog::new(config.run_log, &app_dir, started))
        .with_error_log(ErrorLog::new(config.error_log, &app_dir, started))
    }

    /// Name of the metadata folder that is never removed.
    #[must_use]
    pub fn with_app_folder(mut self, name: &str) -> Self {
        self.app_folder = name.to_string();
        self
    }

    /// Set the checkpoint policy.
    #[must_use]
    pub fn with_checkpoint_policy(mut self, policy: CheckpointPolicy) -> Self {
        self.checkpoint = policy;
        self
    }

    /// Set how entries are removed.
    #[must_use]
    pub fn with_delete_config(mut self, config: DeleteConfig) -> Self {
        self.executor = DeletionExecutor::new(&self.root, config);
        self
    }

    /// Set the run log.
    #[must_use]
    pub fn with_run_log(mut self, run_log: RunLog) -> Self {
        self.run_log = run_log;
        self
    }

    /// Set the error log.
    #[must_use]
    pub fn with_error_log(mut self, error_log: ErrorLog) -> Self {
        self.error_log = error_log;
        self
    }

    /// Poll `coordinator` for termination signals.
    #[must_use]
    pub fn with_shutdown(mut self, coordinator: ShutdownCoordinator) -> Self {
        self.shutdown = Some(coordinator);
        self
    }

    /// Report progress to `callback`.
    #[must_use]
    pub fn with_progress(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress = Some(callback);
        self
    }

    /// The verdict cache.
    #[must_use]
    pub fn cache(&self) -> &VerdictCache {
        &self.cache
    }

    /// Run one pass.
    ///
    /// # Errors
    ///
    /// - [`SweepError::ListDirectory`] if the folder cannot be listed
    /// - [`SweepError::Cache`] if a checkpoint or the final save fails
    /// - [`SweepError::Interrupted`] after a termination signal
    pub fn run(&mut self) -> Result<SweepReport, SweepError> {
        let started = Instant::now();
        let walker = Walker::new(&self.root);
        let total = walker.count()?;

        self.announce(total);
        if let Some(progress) = &self.progress {
            progress.on_scan_start(total);
        }

        let clock = self.checkpoint.start(total, started);
        let mut ctx = RunContext::new(total, started, clock);

        for item in walker.entries() {
            if self.shutdown_requested() {
                self.end_scan();
                return Err(self.interrupt());
            }

            ctx.counters.entries += 1;
            match item {
                Ok(entry) => {
                    if let Some(progress) = &self.progress {
                        progress.on_entry(ctx.counters.entries, &entry.name);
                    }
                    self.visit(&entry, &mut ctx);
                }
                Err(e) if e.is_fatal() => {
                    self.end_scan();
                    self.abort_save();
                    return Err(SweepError::ListDirectory(e));
                }
                Err(e) => {
                    let name = e
                        .path()
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| e.path().display().to_string());
                    self.record_error(&mut ctx, &name, &FileError::Walk(e));
                }
            }

            if ctx.checkpoint.is_due(ctx.counters.entries, Instant::now()) {
                if let Err(e) = self.checkpoint(&ctx) {
                    self.end_scan();
                    return Err(e);
                }
            }
        }
        self.end_scan();

        if self.shutdown_requested() {
            return Err(self.interrupt());
        }

        self.summarize(&ctx);
        let deletions = self.delete(&ctx);
        if deletions.interrupted || self.shutdown_requested() {
            return Err(self.interrupt());
        }
        self.finalize(ctx, deletions)
    }

    fn announce(&mut self, total: usize) {
        self.run_log.line(format!(
            "Let's parse some files, starting on: {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        self.run_log.line(format!("Found {total} files to handle"));
        if self.cache.is_new() {
            self.run_log.line("No previous cache found...");
        } else {
            let size = self.cache.len();
            self.run_log.line(format!(
                "cache contains {} files ({})",
                size,
                percentage(size, total)
            ));
        }
    }

    fn visit(&mut self, entry: &ScanEntry, ctx: &mut RunContext) {
        match entry.kind {
            EntryKind::Directory if entry.name == self.app_folder => {
                log::trace!("Skipping app folder {}", entry.path.display());
            }
            EntryKind::Directory => ctx.directories.push(DeletionCandidate::directory(&entry.name)),
            EntryKind::File if self.cache.path() == Some(entry.path.as_path()) => {
                log::trace!("Skipping cache file {}", entry.path.display());
            }
            EntryKind::File => self.visit_file(entry, ctx),
            EntryKind::Other => log::trace!("Ignoring {}", entry.path.display()),
        }
    }

    fn visit_file(&mut self, entry: &ScanEntry, ctx: &mut RunContext) {
        if let Some(verdict) = self.cache.get(&entry.name) {
            if let Some(reason) = verdict.reason() {
                self.run_log.line(format!(
                    "found a file to delete from cache -> {}",
                    entry.name
                ));
                self.run_log
                    .line(format!("                                  -> {reason}"));
                ctx.files
                    .push(DeletionCandidate::cached_file(&entry.name, reason));
            }
            ctx.counters.skipped += 1;
            return;
        }

        match self.inspect(&entry.path) {
            Ok(verdict) => {
                if let Some(reason) = verdict.reason() {
                    ctx.files.push(DeletionCandidate::file(&entry.name, reason));
                }
                log::trace!("{} -> {}", entry.name, verdict);
                self.cache.set(&entry.name, verdict);
                ctx.counters.processed += 1;
            }
            Err(e) => self.record_error(ctx, &entry.name, &e),
        }
    }

    fn inspect(&self, path: &Path) -> Result<Verdict, FileError> {
        let size = fs::metadata(path)
            .map_err(|source| FileError::Stat {
                path: path.to_path_buf(),
                source,
            })?
            .len();
        let bytes = fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        self.classifier
            .classify(size, &bytes)
            .map_err(|source| FileError::Classify {
                path: path.to_path_buf(),
                source,
            })
    }

    fn record_error(&mut self, ctx: &mut RunContext, name: &str, error: &FileError) {
        ctx.counters.error_count += 1;
        log::debug!("{}: {}", name, error);
        self.error_log.record(name, error.kind_name(), error);
    }

    fn checkpoint(&mut self, ctx: &RunContext) -> Result<(), SweepError> {
        let message = format!(
            "{} files processed [elapsed time: {}]",
            percentage(ctx.counters.entries, ctx.total),
            format_elapsed(ctx.started.elapsed())
        );
        if let Some(progress) = &self.progress {
            progress.on_message(&message);
        }
        self.run_log.line(message);
        if ctx.has_candidates() {
            self.run_log.line(format!(
                "found {} dirs and {} files to delete",
                ctx.directories.len(),
                ctx.files.len()
            ));
        }

        if let Err(e) = self.cache.save(false) {
            log::error!("Checkpoint failed: {}", e);
            self.run_log.line(format!("checkpoint failed: {e}"));
            self.flush_run_log();
            return Err(SweepError::Cache(e));
        }
        Ok(())
    }

    fn summarize(&mut self, ctx: &RunContext) {
        self.run_log.line("==========");
        self.run_log
            .line(format!("Processed {} new files", ctx.counters.processed));
        self.run_log
            .line(format!("Skipped {} cached files", ctx.counters.skipped));
        if ctx.has_candidates() {
            self.run_log.line(format!(
                "found {} ({}) dirs",
                ctx.directories.len(),
                percentage(ctx.directories.len(), ctx.total)
            ));
            self.run_log.line(format!(
                "found {} ({}) files",
                ctx.files.len(),
                percentage(ctx.files.len(), ctx.total)
            ));
        } else {
            self.run_log.line("Found nothing to delete");
        }
    }

    /// Remove queued directories, then queued files, until a signal arrives.
    fn delete(&mut self, ctx: &RunContext) -> BatchDeleteResult {
        let mut phase = DeletePhase {
            run_log: &mut self.run_log,
            shutdown: self.shutdown.as_ref(),
            progress: self.progress.as_deref(),
            done: 0,
            total: ctx.directories.len() + ctx.files.len(),
        };
        let mut result = self.executor.execute(&ctx.directories, Some(&mut phase));
        if !result.interrupted {
            result.merge(self.executor.execute(&ctx.files, Some(&mut phase)));
        }
        result
    }

    fn finalize(
        &mut self,
        ctx: RunContext,
        deletions: BatchDeleteResult,
    ) -> Result<SweepReport, SweepError> {
        if ctx.counters.error_count > 0 {
            let line = match self.error_log.path() {
                Some(path) => format!(
                    "{} errors found, see {} file",
                    ctx.counters.error_count,
                    path.display()
                ),
                None => format!("{} errors found", ctx.counters.error_count),
            };
            self.run_log.line(line);
        }

        let elapsed = ctx.started.elapsed();
        self.run_log
            .line(format!("elapsed time: {}", format_elapsed(elapsed)));
        self.run_log.line(format!(
            "finished on {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ));

        let saved = self.cache.save(true);
        self.flush_run_log();
        saved?;

        Ok(SweepReport {
            counters: ctx.counters,
            total_entries: ctx.total,
            directories: ctx.directories,
            files: ctx.files,
            deletions,
            error_log: self
                .error_log
                .path()
                .filter(|p| p.exists())
                .map(Path::to_path_buf),
            elapsed,
        })
    }

    fn shutdown_requested(&self) -> bool {
        self.shutdown
            .as_ref()
            .is_some_and(ShutdownCoordinator::is_shutdown_requested)
    }

    fn end_scan(&self) {
        if let Some(progress) = &self.progress {
            progress.on_scan_end();
        }
    }

    /// Abbreviated teardown after a signal.
    fn interrupt(&mut self) -> SweepError {
        self.run_log.line(format!(
            "interrupted on {}",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ));
        self.abort_save();
        if let Some(shutdown) = &self.shutdown {
            shutdown.mark_exited();
        }
        SweepError::Interrupted
    }

    /// Save decided verdicts and flush logs, reporting failures only.
    fn abort_save(&mut self) {
        if let Err(e) = self.cache.save(false) {
            log::error!("Failed to save cache: {}", e);
        }
        self.flush_run_log();
    }

    fn flush_run_log(&mut self) {
        if let Err(e) = self.run_log.flush() {
            log::warn!("Failed to write run log: {}", e);
        }
    }
}

/// Deletion observer for one run: journals removals, reports progress
/// across both batches and stops on a termination signal.
struct DeletePhase<'a> {
    run_log: &'a mut RunLog,
    shutdown: Option<&'a ShutdownCoordinator>,
    progress: Option<&'a dyn ProgressCallback>,
    done: usize,
    total: usize,
}

impl DeleteObserver for DeletePhase<'_> {
    fn on_before_delete(&mut self, candidate: &DeletionCandidate, index: usize, total: usize) {
        self.done += 1;
        if let Some(progress) = self.progress {
            progress.on_delete(self.done, self.total, &candidate.name);
        }
        self.run_log.on_before_delete(candidate, index, total);
    }

    fn on_delete_failure(&mut self, candidate: &DeletionCandidate, error: &DeleteError) {
        self.run_log.on_delete_failure(candidate, error);
    }

    fn should_stop(&self) -> bool {
        self.shutdown
            .is_some_and(ShutdownCoordinator::is_shutdown_requested)
    }
}
