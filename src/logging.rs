//! Logging infrastructure for pixel_mage.
//!
//! Two layers live here:
//!
//! - Console logging through the `log` facade with the `env_logger` backend,
//!   configured once by [`init_logging`].
//! - [`RunLog`], the human-readable journal of one run. Each line is emitted
//!   through `log` and, when enabled, buffered and appended to
//!   `<app folder>/log-<timestamp>.txt`.
//!
//! Console log levels are determined by (in priority order):
//!
//! 1. `RUST_LOG` environment variable (if set)
//! 2. CLI flags: `--quiet` (error only) or `--verbose` (debug/trace)
//! 3. Default: info level
//!
//! # Example
//!
//! ```rust,no_run
//! use pixel_mage::logging::init_logging;
//!
//! // Initialize with default (info) level
//! init_logging(0, false);
//! ```

use std::env;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use env_logger::Builder;
use log::LevelFilter;

use crate::actions::{DeleteError, DeleteObserver, DeletionCandidate};
use crate::scanner::EntryKind;

/// Buffered lines before the run log is appended to its file.
pub const DEFAULT_FLUSH_AFTER: usize = 10;

/// Initialize the logging subsystem based on CLI verbosity flags.
///
/// Calling it a second time is harmless: the first logger stays installed.
///
/// # Arguments
///
/// * `verbose` - Verbosity count from CLI (0=normal, 1=debug, 2+=trace)
/// * `quiet` - If true, only show errors (overridden by RUST_LOG)
pub fn init_logging(verbose: u8, quiet: bool) {
    let use_env = env::var("RUST_LOG").is_ok();

    let mut builder = Builder::new();

    if use_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    configure_format(&mut builder, verbose);

    if builder.try_init().is_err() {
        log::debug!("Logger already initialized");
        return;
    }

    if use_env {
        log::debug!(
            "Logging initialized from RUST_LOG environment variable: {:?}",
            env::var("RUST_LOG").ok()
        );
    } else {
        log::debug!("Logging initialized at level: {:?}", determine_level(verbose, quiet));
    }
}

/// Determine the log level from CLI flags.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Info,
            1 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }
}

/// Configure the log format based on build type and verbosity.
///
/// - Debug builds: timestamp, level, module path when verbose
/// - Release builds: compact format (level + message only)
fn configure_format(builder: &mut Builder, verbose: u8) {
    #[cfg(debug_assertions)]
    {
        builder.format(move |buf, record| {
            let timestamp = buf.timestamp_seconds();
            let level = record.level();
            let level_style = buf.default_level_style(level);

            if verbose >= 1 {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} [{}] {}",
                    timestamp,
                    level,
                    record.module_path().unwrap_or("unknown"),
                    record.args()
                )
            } else {
                writeln!(
                    buf,
                    "{} {level_style}{:<5}{level_style:#} {}",
                    timestamp,
                    level,
                    record.args()
                )
            }
        });
    }

    #[cfg(not(debug_assertions))]
    {
        let _ = verbose;
        builder.format(|buf, record| {
            let level = record.level();
            let level_style = buf.default_level_style(level);
            writeln!(
                buf,
                "{level_style}{:<5}{level_style:#} {}",
                level,
                record.args()
            )
        });
    }
}

/// Timestamp suitable for file names: `2024-01-31_23-59-59`.
#[must_use]
pub fn file_stamp(time: DateTime<Utc>) -> String {
    time.format("%Y-%m-%d_%H-%M-%S").to_string()
}

/// `part` as a percentage of `total`, two decimals.
#[must_use]
pub fn percentage(part: usize, total: usize) -> String {
    if total == 0 {
        return "0.00%".to_string();
    }
    format!("{:.2}%", part as f64 * 100.0 / total as f64)
}

/// Elapsed time as `HH:MM:SS`.
#[must_use]
pub fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    format!("{:02}:{:02}:{:02}", secs / 3600, (secs / 60) % 60, secs % 60)
}

/// Where run-log lines go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogOutputs {
    /// Master switch; when false nothing is recorded anywhere.
    pub enabled: bool,
    /// Emit lines at info level (debug level otherwise).
    pub display: bool,
    /// Append lines to a file in the app folder.
    pub file: bool,
}

impl Default for LogOutputs {
    fn default() -> Self {
        Self {
            enabled: true,
            display: true,
            file: true,
        }
    }
}

impl LogOutputs {
    /// Outputs with everything switched off.
    #[must_use]
    pub fn none() -> Self {
        Self {
            enabled: false,
            display: false,
            file: false,
        }
    }

    /// Whether anything is recorded at all.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.enabled && (self.display || self.file)
    }
}

/// Journal of one run: progress, deletions, summary.
#[derive(Debug)]
pub struct RunLog {
    file: Option<PathBuf>,
    display: bool,
    enabled: bool,
    pending: Vec<String>,
    flush_after: usize,
}

impl RunLog {
    /// Create a run log writing `log-<stamp>.txt` into `dir`.
    #[must_use]
    pub fn new(outputs: LogOutputs, dir: &Path, started: DateTime<Utc>) -> Self {
        let enabled = outputs.is_active();
        let file = (enabled && outputs.file)
            .then(|| dir.join(format!("log-{}.txt", file_stamp(started))));
        Self {
            file,
            display: outputs.display,
            enabled,
            pending: Vec::new(),
            flush_after: DEFAULT_FLUSH_AFTER,
        }
    }

    /// A run log that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            file: None,
            display: false,
            enabled: false,
            pending: Vec::new(),
            flush_after: DEFAULT_FLUSH_AFTER,
        }
    }

    /// Change how many lines are buffered before writing.
    #[must_use]
    pub fn with_flush_after(mut self, lines: usize) -> Self {
        self.flush_after = lines;
        self
    }

    /// File the log is appended to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Record one line.
    pub fn line(&mut self, message: impl Into<String>) {
        if !self.enabled {
            return;
        }
        let message = message.into();
        if self.display {
            log::info!("{message}");
        } else {
            log::debug!("{message}");
        }

        if self.file.is_some() {
            self.pending.push(message);
            if self.pending.len() > self.flush_after {
                if let Err(e) = self.flush() {
                    log::warn!("Failed to write run log: {}", e);
                }
            }
        }
    }

    /// Append buffered lines to the log file.
    ///
    /// # Errors
    ///
    /// Returns the IO error when the file cannot be created or appended to;
    /// the buffered lines are kept for the next attempt.
    pub fn flush(&mut self) -> io::Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        if self.pending.is_empty() {
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut text = self.pending.join("\n");
        text.push('\n');
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(text.as_bytes())?;
        self.pending.clear();
        Ok(())
    }
}

impl DeleteObserver for RunLog {
    fn on_before_delete(&mut self, candidate: &DeletionCandidate, _index: usize, _total: usize) {
        match candidate.kind {
            EntryKind::Directory => self.line(format!("[DIR] removing {}", candidate.name)),
            _ => self.line(format!(
                "[files] removing {} because: {}",
                candidate.name,
                candidate.display_reason()
            )),
        }
    }

    fn on_delete_failure(&mut self, candidate: &DeletionCandidate, error: &DeleteError) {
        self.line(format!("failed to remove {}: {}", candidate.name, error));
    }
}
