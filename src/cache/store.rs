//! JSON-backed verdict store.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use thiserror::Error;

use super::entry::{CacheFile, CacheMeta, LastExit, CACHE_VERSION, NEW_CACHE};
use crate::classifier::Verdict;

/// Error type for cache file operations.
#[derive(Debug, Error)]
pub enum CacheError {
    /// The cache file could not be read.
    #[error("failed to read cache file {path}: {source}")]
    Read {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The cache file is not a well-formed cache document.
    #[error("cache file {path} is malformed: {source}")]
    Parse {
        /// Cache file path
        path: PathBuf,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The cache file was written by an incompatible format version.
    #[error("unsupported cache version {found} in {path} (expected 1)")]
    Version {
        /// Cache file path
        path: PathBuf,
        /// Version found in the file
        found: u32,
    },

    /// The in-memory cache could not be serialized.
    #[error("failed to serialize cache: {0}")]
    Serialize(#[source] serde_json::Error),

    /// The cache file (or its directory) could not be written.
    #[error("failed to write cache file {path}: {source}")]
    Write {
        /// Cache file path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// In-memory filename → verdict map with explicit persistence.
///
/// Loading never fails: a missing, unreadable or incompatible file gives an
/// empty cache. Saving does fail loudly, since a lost write means lost
/// verdicts.
///
/// A cache without a path is disabled: it starts empty and saves are no-ops.
#[derive(Debug, Clone)]
pub struct VerdictCache {
    path: Option<PathBuf>,
    meta: CacheMeta,
    files: BTreeMap<String, Verdict>,
}

impl VerdictCache {
    /// A cache that never touches the disk.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            path: None,
            meta: CacheMeta::default(),
            files: BTreeMap::new(),
        }
    }

    /// Open the cache at `path`, or a disabled cache when `path` is `None`.
    #[must_use]
    pub fn open(path: Option<PathBuf>) -> Self {
        match path {
            Some(path) => Self::load(path),
            None => Self::disabled(),
        }
    }

    /// Load the cache stored at `path`, falling back to an empty cache.
    #[must_use]
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let (meta, files) = match Self::read_file(&path) {
            Ok(file) => {
                log::debug!(
                    "Loaded {} cached verdicts from {}",
                    file.files.len(),
                    path.display()
                );
                (file.meta, file.files)
            }
            Err(e) => {
                log::debug!("Starting with an empty cache: {}", e);
                (CacheMeta::default(), BTreeMap::new())
            }
        };
        Self {
            path: Some(path),
            meta,
            files,
        }
    }

    /// Read and validate a cache file without any fallback.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Read`], [`CacheError::Parse`] or
    /// [`CacheError::Version`].
    pub fn read_file(path: &Path) -> CacheResult<CacheFile> {
        let content = fs::read_to_string(path).map_err(|source| CacheError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CacheFile = serde_json::from_str(&content).map_err(|source| CacheError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if file.meta.version != CACHE_VERSION {
            return Err(CacheError::Version {
                path: path.to_path_buf(),
                found: file.meta.version,
            });
        }
        Ok(file)
    }

    /// Cached verdict for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Verdict> {
        self.files.get(name)
    }

    /// Record a verdict in memory. Nothing is written until [`save`](Self::save).
    pub fn set(&mut self, name: impl Into<String>, verdict: Verdict) {
        self.files.insert(name.into(), verdict);
    }

    /// Number of cached filenames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no filename is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// `meta.last_run` as loaded, or [`NEW_CACHE`].
    #[must_use]
    pub fn last_run(&self) -> &str {
        &self.meta.last_run
    }

    /// How the run that wrote the loaded file ended.
    #[must_use]
    pub fn last_exit(&self) -> LastExit {
        self.meta.last_exit
    }

    /// Whether there was no usable cache file at load time.
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.meta.last_run == NEW_CACHE
    }

    /// Whether the cache is backed by a file.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.path.is_some()
    }

    /// Backing file, if enabled.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Read-only view of all cached verdicts.
    #[must_use]
    pub fn files(&self) -> &BTreeMap<String, Verdict> {
        &self.files
    }

    /// Persist the cache.
    ///
    /// With `prune == false` every verdict is written and the file is marked
    /// `interrupted`. With `prune == true` delete verdicts are dropped (from
    /// memory as well) and the file is marked `clean`.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Write`] when the directory or file cannot be
    /// written.
    pub fn save(&mut self, prune: bool) -> CacheResult<()> {
        let Some(path) = self.path.clone() else {
            return Ok(());
        };

        if prune {
            let before = self.files.len();
            self.files.retain(|_, verdict| !verdict.is_delete());
            log::debug!("Pruned {} delete verdicts", before - self.files.len());
        }

        let document = CacheFile {
            meta: CacheMeta {
                last_run: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
                last_exit: if prune {
                    LastExit::Clean
                } else {
                    LastExit::Interrupted
                },
                version: CACHE_VERSION,
            },
            files: self.files.clone(),
        };

        let json = serde_json::to_string(&document).map_err(CacheError::Serialize)?;
        write_replacing(&path, json.as_bytes()).map_err(|source| CacheError::Write {
            path: path.clone(),
            source,
        })?;

        log::debug!(
            "Saved {} verdicts to {} ({:?})",
            self.files.len(),
            path.display(),
            document.meta.last_exit
        );
        Ok(())
    }
}

/// Write `bytes` to a sibling temp file, then rename it over `path`.
fn write_replacing(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}
