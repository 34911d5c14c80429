//! Progress reporting for the sweep.
//!
//! This module provides the [`Progress`] struct which implements
//! [`ProgressCallback`] using `indicatif` to display a progress bar over the
//! entries of the target folder.

use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};

/// Callback trait for progress reporting.
///
/// Every method has a default no-op body except the per-entry hook, so
/// lightweight observers (tests, JSON front-ends) implement only what they
/// need.
pub trait ProgressCallback: Send + Sync {
    /// Called once the entries of the target folder have been counted.
    fn on_scan_start(&self, _total: usize) {}

    /// Called for every entry, `current` counting from 1.
    fn on_entry(&self, current: usize, name: &str);

    /// Called with checkpoint and status messages.
    fn on_message(&self, _message: &str) {}

    /// Called when the scan loop ends, interrupted or not.
    fn on_scan_end(&self) {}

    /// Called before each removal, `current` counting from 1 across
    /// directories and files.
    fn on_delete(&self, _current: usize, _total: usize, _name: &str) {}
}

/// Progress reporter using indicatif.
pub struct Progress {
    bar: Mutex<Option<ProgressBar>>,
    quiet: bool,
}

impl Progress {
    /// Create a new progress reporter.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, no progress bar will be displayed.
    ///
    /// # Examples
    ///
    /// ```
    /// use pixel_mage::progress::Progress;
    ///
    /// let progress = Progress::new(false);
    /// ```
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            quiet,
        }
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
    }

    fn with_bar(&self, f: impl FnOnce(&ProgressBar)) {
        let guard = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(ref pb) = *guard {
            f(pb);
        }
    }
}

impl ProgressCallback for Progress {
    fn on_scan_start(&self, total: usize) {
        if self.quiet {
            return;
        }
        let pb = ProgressBar::new(total as u64);
        pb.set_style(Self::style());
        pb.set_message("Scanning");
        pb.enable_steady_tick(Duration::from_millis(100));
        *self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = Some(pb);
    }

    fn on_entry(&self, current: usize, name: &str) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| {
            pb.set_position(current as u64);
            pb.set_message(truncate_name(name, 30));
        });
    }

    fn on_message(&self, message: &str) {
        if self.quiet {
            return;
        }
        self.with_bar(|pb| pb.set_message(message.to_string()));
    }

    fn on_scan_end(&self) {
        if self.quiet {
            return;
        }
        let bar = self
            .bar
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .take();
        if let Some(pb) = bar {
            pb.finish_and_clear();
        }
    }
}

/// Truncate an entry name for display in the progress bar.
fn truncate_name(name: &str, max_len: usize) -> String {
    let count = name.chars().count();
    if count <= max_len {
        return name.to_string();
    }
    let tail: String = name.chars().skip(count - (max_len - 3)).collect();
    format!("...{tail}")
}
