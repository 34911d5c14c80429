//! Scanner module for listing the target folder.
//!
//! The target folder is examined one level deep: files are classified,
//! subdirectories are removed wholesale, and nothing below them is visited.
//!
//! # Architecture
//!
//! - [`walker`]: [`Walker`] counts and enumerates the entries of one folder
//!
//! # Example
//!
//! ```no_run
//! use pixel_mage::scanner::{EntryKind, Walker};
//! use std::path::Path;
//!
//! let walker = Walker::new(Path::new("/wallpapers"));
//! println!("{} entries", walker.count().expect("folder is readable"));
//! for entry in walker.entries() {
//!     match entry {
//!         Ok(e) if e.kind == EntryKind::File => println!("file: {}", e.name),
//!         Ok(_) => {}
//!         Err(e) => eprintln!("Warning: {}", e),
//!     }
//! }
//! ```

pub mod walker;

use std::path::PathBuf;

pub use walker::Walker;

/// What an entry of the target folder is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Regular file.
    File,
    /// Subdirectory.
    Directory,
    /// Symlink, socket, FIFO or anything else; counted but never touched.
    Other,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File => write!(f, "file"),
            Self::Directory => write!(f, "dir"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// One entry of the target folder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanEntry {
    /// File name, used as the cache key.
    pub name: String,
    /// Full path, used for IO.
    pub path: PathBuf,
    /// Entry type (symlinks are not followed).
    pub kind: EntryKind,
}

impl ScanEntry {
    /// Create a new scan entry.
    #[must_use]
    pub fn new(name: impl Into<String>, path: PathBuf, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            path,
            kind,
        }
    }
}

/// Errors that can occur while listing the target folder.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    /// The specified path was not found.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// The specified path is not a directory.
    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    /// The folder itself could not be listed.
    #[error("Cannot list {path}: {source}")]
    Unreadable {
        /// Folder that failed to open
        path: PathBuf,
        /// The underlying walk error
        #[source]
        source: walkdir::Error,
    },

    /// A single entry could not be inspected.
    #[error("Cannot inspect entry {path}: {source}")]
    Entry {
        /// Path of the entry, when known
        path: PathBuf,
        /// The underlying walk error
        #[source]
        source: walkdir::Error,
    },

    /// The entry name is not valid UTF-8 and is left untouched.
    #[error("Entry name is not valid UTF-8: {0}")]
    InvalidName(PathBuf),
}

impl ScanError {
    /// Whether the error prevents listing the folder at all.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::Entry { .. } | Self::InvalidName(_))
    }

    /// Path the error refers to.
    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        match self {
            Self::NotFound(p) | Self::NotADirectory(p) | Self::InvalidName(p) => p,
            Self::Unreadable { path, .. } | Self::Entry { path, .. } => path,
        }
    }
}
