//! Mutable state of one run.

use std::time::Instant;

use crate::actions::DeletionCandidate;

use super::checkpoint::CheckpointClock;

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounters {
    /// Files classified during this run.
    pub processed: usize,
    /// Files answered from the cache.
    pub skipped: usize,
    /// Files that could not be read or classified.
    pub error_count: usize,
    /// Entries visited so far, of any kind.
    pub entries: usize,
}

/// Everything a run accumulates while walking the target folder.
#[derive(Debug)]
pub(crate) struct RunContext {
    pub counters: RunCounters,
    pub total: usize,
    pub directories: Vec<DeletionCandidate>,
    pub files: Vec<DeletionCandidate>,
    pub started: Instant,
    pub checkpoint: CheckpointClock,
}

impl RunContext {
    pub fn new(total: usize, started: Instant, checkpoint: CheckpointClock) -> Self {
        Self {
            counters: RunCounters::default(),
            total,
            directories: Vec::new(),
            files: Vec::new(),
            started,
            checkpoint,
        }
    }

    /// Whether anything has been queued for deletion.
    pub fn has_candidates(&self) -> bool {
        !self.directories.is_empty() || !self.files.is_empty()
    }
}
