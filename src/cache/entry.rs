//! Cache file definitions.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::classifier::Verdict;

/// Current version of the cache file format.
pub const CACHE_VERSION: u32 = 1;

/// `last_run` marker of a cache that has never been written.
pub const NEW_CACHE: &str = "new_cache";

/// How the run that wrote the cache file ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LastExit {
    /// No run has written this cache yet.
    NewCache,
    /// Run finished and pruned delete verdicts.
    Clean,
    /// Checkpoint or interrupted run; delete verdicts are still present.
    Interrupted,
}

/// Metadata block of the cache file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheMeta {
    /// ISO-8601 timestamp of the writing run, or [`NEW_CACHE`].
    pub last_run: String,
    /// How the writing run ended.
    pub last_exit: LastExit,
    /// Format version, always [`CACHE_VERSION`] for accepted files.
    pub version: u32,
}

impl Default for CacheMeta {
    fn default() -> Self {
        Self {
            last_run: NEW_CACHE.to_string(),
            last_exit: LastExit::NewCache,
            version: CACHE_VERSION,
        }
    }
}

/// The persisted cache document.
///
/// ```json
/// { "meta": { "last_run": "2024-01-01T00:00:00.000Z", "last_exit": "clean", "version": 1 },
///   "files": { "a.jpg": "", "b.jpg": "too_small: [800x600]" } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheFile {
    /// Run metadata.
    pub meta: CacheMeta,
    /// Filename to verdict.
    pub files: BTreeMap<String, Verdict>,
}
