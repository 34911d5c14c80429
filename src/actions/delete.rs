//! Best-effort removal of flagged files and directories.
//!
//! # Overview
//!
//! After a scan, every entry marked for deletion becomes a
//! [`DeletionCandidate`]. The [`DeletionExecutor`] removes them relative to
//! the target folder:
//! - Directories are removed recursively
//! - Files are unlinked, or moved to the system trash in trash mode
//! - A failure is logged and recorded; the remaining candidates still run
//!
//! # Example
//!
//! ```no_run
//! use pixel_mage::actions::delete::{DeleteConfig, DeletionCandidate, DeletionExecutor};
//! use std::path::Path;
//!
//! let executor = DeletionExecutor::new(Path::new("/wallpapers"), DeleteConfig::permanent());
//! let candidates = vec![DeletionCandidate::file("tiny.jpg", "too_small: [640x480]")];
//! let result = executor.execute(&candidates, None);
//! println!("{}", result.summary());
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use thiserror::Error;

use crate::scanner::EntryKind;

/// Error type for deletion operations.
#[derive(Debug, Error)]
pub enum DeleteError {
    /// Entry was not found (may have been deleted or moved).
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// Permission denied when attempting to delete.
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),

    /// Trash operation failed.
    #[error("trash operation failed for {path}: {message}")]
    TrashFailed {
        /// Entry that could not be trashed
        path: PathBuf,
        /// Message reported by the platform trash
        message: String,
    },

    /// General I/O error.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Entry that could not be removed
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl DeleteError {
    /// Path associated with this error.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound(p)
            | Self::PermissionDenied(p)
            | Self::TrashFailed { path: p, .. }
            | Self::Io { path: p, .. } => p,
        }
    }

    fn from_io(path: &Path, e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: e,
            },
        }
    }
}

/// An entry of the target folder queued for removal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletionCandidate {
    /// Entry name relative to the target folder.
    pub name: String,
    /// Why it is being removed.
    pub reason: String,
    /// File or directory.
    pub kind: EntryKind,
    /// Whether the verdict came from the cache rather than this run.
    pub from_cache: bool,
}

impl DeletionCandidate {
    /// A file flagged by the classifier.
    #[must_use]
    pub fn file(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: reason.into(),
            kind: EntryKind::File,
            from_cache: false,
        }
    }

    /// A file flagged by a cached verdict.
    #[must_use]
    pub fn cached_file(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            from_cache: true,
            ..Self::file(name, reason)
        }
    }

    /// A subdirectory of the target folder.
    #[must_use]
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            reason: "directory".to_string(),
            kind: EntryKind::Directory,
            from_cache: false,
        }
    }

    /// Reason as shown in logs, tagged when it came from the cache.
    #[must_use]
    pub fn display_reason(&self) -> String {
        if self.from_cache {
            format!("{} [cache]", self.reason)
        } else {
            self.reason.clone()
        }
    }
}

/// Result of a successful deletion.
#[derive(Debug, Clone)]
pub struct DeleteResult {
    /// Path that was deleted.
    pub path: PathBuf,
    /// Size in bytes (files only; directories report 0).
    pub size: u64,
    /// Whether deletion was permanent (true) or to trash (false).
    pub permanent: bool,
}

impl DeleteResult {
    /// Create a new delete result.
    #[must_use]
    pub fn new(path: PathBuf, size: u64, permanent: bool) -> Self {
        Self {
            path,
            size,
            permanent,
        }
    }
}

/// Results of a batch deletion.
#[derive(Debug, Clone, Default)]
pub struct BatchDeleteResult {
    /// Successfully deleted entries.
    pub successes: Vec<DeleteResult>,
    /// Failed deletions with their error messages.
    pub failures: Vec<(PathBuf, String)>,
    /// Total bytes freed by file deletions.
    pub bytes_freed: u64,
    /// Whether the observer stopped the batch before every candidate was tried.
    pub interrupted: bool,
}

impl BatchDeleteResult {
    /// Number of successful deletions.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.successes.len()
    }

    /// Number of failed deletions.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures.len()
    }

    /// Check if all deletions succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }

    /// Fold another batch into this one.
    pub fn merge(&mut self, other: BatchDeleteResult) {
        self.bytes_freed += other.bytes_freed;
        self.successes.extend(other.successes);
        self.failures.extend(other.failures);
        self.interrupted |= other.interrupted;
    }

    /// Human-readable summary of the operation.
    #[must_use]
    pub fn summary(&self) -> String {
        if self.all_succeeded() {
            format!(
                "Deleted {} entries, freed {}",
                self.success_count(),
                ByteSize(self.bytes_freed)
            )
        } else {
            format!(
                "Deleted {} entries, {} failed, freed {}",
                self.success_count(),
                self.failure_count(),
                ByteSize(self.bytes_freed)
            )
        }
    }
}

/// Configuration for deletion operations.
#[derive(Debug, Clone, Default)]
pub struct DeleteConfig {
    /// Move to the system trash instead of removing.
    pub trash: bool,
}

impl DeleteConfig {
    /// Create config for permanent deletion.
    #[must_use]
    pub fn permanent() -> Self {
        Self { trash: false }
    }

    /// Create config for trash deletion.
    #[must_use]
    pub fn trash() -> Self {
        Self { trash: true }
    }
}

/// Receives notifications while a batch runs.
pub trait DeleteObserver {
    /// Called before each removal.
    fn on_before_delete(&mut self, candidate: &DeletionCandidate, index: usize, total: usize);

    /// Called after a failed removal.
    fn on_delete_failure(&mut self, candidate: &DeletionCandidate, error: &DeleteError);

    /// Polled before each removal; `true` abandons the rest of the batch.
    fn should_stop(&self) -> bool {
        false
    }
}

/// Removes [`DeletionCandidate`]s relative to a root folder.
#[derive(Debug, Clone)]
pub struct DeletionExecutor {
    root: PathBuf,
    config: DeleteConfig,
}

impl DeletionExecutor {
    /// Create an executor for entries of `root`.
    #[must_use]
    pub fn new(root: &Path, config: DeleteConfig) -> Self {
        Self {
            root: root.to_path_buf(),
            config,
        }
    }

    /// Remove every candidate; failures never stop the batch, only the
    /// observer's [`DeleteObserver::should_stop`] does.
    pub fn execute(
        &self,
        candidates: &[DeletionCandidate],
        mut observer: Option<&mut dyn DeleteObserver>,
    ) -> BatchDeleteResult {
        let mut result = BatchDeleteResult::default();
        let total = candidates.len();

        for (index, candidate) in candidates.iter().enumerate() {
            if observer.as_deref().is_some_and(|obs| obs.should_stop()) {
                log::debug!("Deletion stopped with {} entries left", total - index);
                result.interrupted = true;
                break;
            }
            if let Some(obs) = observer.as_deref_mut() {
                obs.on_before_delete(candidate, index, total);
            }

            match self.remove(candidate) {
                Ok(del) => {
                    result.bytes_freed += del.size;
                    result.successes.push(del);
                }
                Err(e) => {
                    log::warn!("Failed to delete {}: {}", e.path().display(), e);
                    if let Some(obs) = observer.as_deref_mut() {
                        obs.on_delete_failure(candidate, &e);
                    }
                    result.failures.push((e.path().to_path_buf(), e.to_string()));
                }
            }
        }

        if total > 0 {
            log::debug!("{}", result.summary());
        }
        result
    }

    /// Remove one candidate.
    ///
    /// # Errors
    ///
    /// Returns a [`DeleteError`] describing why the entry could not be removed.
    pub fn remove(&self, candidate: &DeletionCandidate) -> Result<DeleteResult, DeleteError> {
        let path = self.root.join(&candidate.name);
        if self.config.trash {
            delete_to_trash(&path)
        } else {
            match candidate.kind {
                EntryKind::Directory => permanent_delete_dir(&path),
                _ => permanent_delete(&path),
            }
        }
    }
}

/// Move a file or directory to the system trash.
///
/// # Errors
///
/// - `NotFound` if the entry doesn't exist
/// - `TrashFailed` if the trash operation fails
pub fn delete_to_trash(path: &Path) -> Result<DeleteResult, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    let size = if metadata.is_file() { metadata.len() } else { 0 };

    trash::delete(path).map_err(|e| {
        log::error!("Trash operation failed for {}: {}", path.display(), e);
        DeleteError::TrashFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
    })?;

    log::debug!("Moved to trash: {} ({})", path.display(), ByteSize(size));
    Ok(DeleteResult::new(path.to_path_buf(), size, false))
}

/// Permanently delete a single file.
///
/// # Errors
///
/// - `NotFound` if the file doesn't exist
/// - `PermissionDenied` if deletion is not allowed
/// - `Io` for any other failure
pub fn permanent_delete(path: &Path) -> Result<DeleteResult, DeleteError> {
    let metadata = fs::symlink_metadata(path).map_err(|e| DeleteError::from_io(path, e))?;
    let size = metadata.len();

    fs::remove_file(path).map_err(|e| DeleteError::from_io(path, e))?;

    log::debug!("Deleted: {} ({})", path.display(), ByteSize(size));
    Ok(DeleteResult::new(path.to_path_buf(), size, true))
}

/// Permanently delete a directory and everything below it.
///
/// # Errors
///
/// Same as [`permanent_delete`].
pub fn permanent_delete_dir(path: &Path) -> Result<DeleteResult, DeleteError> {
    fs::remove_dir_all(path).map_err(|e| DeleteError::from_io(path, e))?;
    log::debug!("Deleted directory: {}", path.display());
    Ok(DeleteResult::new(path.to_path_buf(), 0, true))
}
