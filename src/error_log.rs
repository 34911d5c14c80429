//! Append-only record of per-file failures.
//!
//! Every file that could not be read or classified gets one block in
//! `<app folder>/errors-<timestamp>.txt`:
//!
//! ```text
//! broken.jpg on 2024-03-05T07:08:09.000Z
//!     Classify
//!     could not read image dimensions: unrecognised image format
//!     caused by: unrecognised image format
//! ```

use std::error::Error as StdError;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::logging::{file_stamp, LogOutputs};

/// Writes error blocks for files that failed during the scan.
#[derive(Debug)]
pub struct ErrorLog {
    file: Option<PathBuf>,
    display: bool,
    enabled: bool,
    started: DateTime<Utc>,
    recorded: usize,
}

impl ErrorLog {
    /// Create an error log writing `errors-<stamp>.txt` into `dir`.
    #[must_use]
    pub fn new(outputs: LogOutputs, dir: &Path, started: DateTime<Utc>) -> Self {
        let enabled = outputs.is_active();
        Self {
            file: (enabled && outputs.file)
                .then(|| dir.join(format!("errors-{}.txt", file_stamp(started)))),
            display: outputs.display,
            enabled,
            started,
            recorded: 0,
        }
    }

    /// An error log that records nothing.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(LogOutputs::none(), Path::new(""), Utc::now())
    }

    /// File errors are appended to, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    /// Number of blocks recorded this run.
    #[must_use]
    pub fn recorded(&self) -> usize {
        self.recorded
    }

    /// Record a failure for `name`.
    ///
    /// `kind` is a short identifier of the failure class. A write failure is
    /// logged and otherwise ignored.
    pub fn record(&mut self, name: &str, kind: &str, error: &(dyn StdError + 'static)) {
        if !self.enabled {
            return;
        }
        self.recorded += 1;

        if self.display {
            log::warn!("{name}: {error}");
        }
        if self.file.is_some() {
            let block = self.format_block(name, kind, error);
            if let Err(e) = self.append(&block) {
                log::warn!("Failed to write error log: {}", e);
            }
        }
    }

    fn format_block(&self, name: &str, kind: &str, error: &(dyn StdError + 'static)) -> String {
        let mut block = format!(
            "{} on {}\n    {}\n    {}\n",
            name,
            self.started.to_rfc3339_opts(SecondsFormat::Millis, true),
            kind,
            error
        );
        let mut source = error.source();
        while let Some(cause) = source {
            block.push_str(&format!("    caused by: {cause}\n"));
            source = cause.source();
        }
        block.push('\n');
        block
    }

    fn append(&self, block: &str) -> io::Result<()> {
        let Some(path) = &self.file else {
            return Ok(());
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.write_all(block.as_bytes())
    }
}
