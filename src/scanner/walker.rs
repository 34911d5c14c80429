//! Single-level folder listing using walkdir.
//!
//! # Overview
//!
//! [`Walker`] lists the immediate children of the target folder. It is used
//! twice per run: once to count entries for progress percentages and once to
//! drive the scan. Entries come back in enumeration order, unsorted.
//!
//! Symlinks are reported as [`EntryKind::Other`] and never followed.

use std::path::{Path, PathBuf};

use walkdir::{DirEntry, WalkDir};

use super::{EntryKind, ScanEntry, ScanError};

/// Lister for the direct children of one folder.
#[derive(Debug, Clone)]
pub struct Walker {
    /// Folder to list
    root: PathBuf,
}

impl Walker {
    /// Create a new walker for the given folder.
    #[must_use]
    pub fn new(path: &Path) -> Self {
        Self {
            root: path.to_path_buf(),
        }
    }

    /// Count entries without inspecting them.
    ///
    /// Entries that fail to be inspected still count.
    ///
    /// # Errors
    ///
    /// Fails when the folder is missing, not a directory or unreadable.
    pub fn count(&self) -> Result<usize, ScanError> {
        let mut total = 0;
        for item in self.entries() {
            match item {
                Ok(_) => total += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(_) => total += 1,
            }
        }
        Ok(total)
    }

    /// Iterate over the folder's entries.
    ///
    /// A failure to open the folder itself is yielded once as a fatal
    /// [`ScanError`]; per-entry failures are yielded as
    /// [`ScanError::Entry`] and iteration continues.
    pub fn entries(&self) -> Box<dyn Iterator<Item = Result<ScanEntry, ScanError>>> {
        if let Err(e) = self.validate_root() {
            return Box::new(std::iter::once(Err(e)));
        }

        let root = self.root.clone();
        let iter = WalkDir::new(&self.root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .into_iter()
            .map(move |item| match item {
                Ok(entry) => to_scan_entry(&entry),
                Err(source) if source.depth() == 0 => Err(ScanError::Unreadable {
                    path: root.clone(),
                    source,
                }),
                Err(source) => Err(ScanError::Entry {
                    path: source.path().map_or_else(|| root.clone(), Path::to_path_buf),
                    source,
                }),
            });
        Box::new(iter)
    }

    fn validate_root(&self) -> Result<(), ScanError> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => Ok(()),
            Ok(_) => Err(ScanError::NotADirectory(self.root.clone())),
            Err(_) => Err(ScanError::NotFound(self.root.clone())),
        }
    }
}

fn to_scan_entry(entry: &DirEntry) -> Result<ScanEntry, ScanError> {
    // Names are cache keys and deletion targets, so they must round-trip.
    let Some(name) = entry.file_name().to_str() else {
        return Err(ScanError::InvalidName(entry.path().to_path_buf()));
    };
    let file_type = entry.file_type();
    let kind = if file_type.is_dir() {
        EntryKind::Directory
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    };
    Ok(ScanEntry::new(name, entry.path().to_path_buf(), kind))
}
