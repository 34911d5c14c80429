//! When to persist intermediate progress.
//!
//! A checkpoint is due when the number of visited entries is a multiple of
//! the chunk size (`total / 200`, rounded, at least 1) and the interval has
//! passed since the previous checkpoint.

use std::time::{Duration, Instant};

/// Default minimum time between checkpoints.
pub const DEFAULT_CHECKPOINT_INTERVAL: Duration = Duration::from_secs(5);

const CHUNKS_PER_RUN: f64 = 200.0;

/// Checkpoint settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointPolicy {
    /// Minimum time between checkpoints.
    pub interval: Duration,
}

impl Default for CheckpointPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_INTERVAL)
    }
}

impl CheckpointPolicy {
    /// Policy with the given minimum interval.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    /// Entries between two checkpoint opportunities for a folder of `total`.
    #[must_use]
    pub fn chunk_size(total: usize) -> usize {
        ((total as f64 / CHUNKS_PER_RUN).round() as usize).max(1)
    }

    /// Start tracking a run over `total` entries beginning at `now`.
    #[must_use]
    pub fn start(self, total: usize, now: Instant) -> CheckpointClock {
        CheckpointClock {
            chunk: Self::chunk_size(total),
            interval: self.interval,
            last: now,
        }
    }
}

/// Per-run checkpoint state.
#[derive(Debug, Clone)]
pub struct CheckpointClock {
    chunk: usize,
    interval: Duration,
    last: Instant,
}

impl CheckpointClock {
    /// Chunk size in use.
    #[must_use]
    pub fn chunk(&self) -> usize {
        self.chunk
    }

    /// Whether a checkpoint is due after `entries` visited entries.
    ///
    /// A `true` answer restarts the interval.
    pub fn is_due(&mut self, entries: usize, now: Instant) -> bool {
        if entries == 0 || entries % self.chunk != 0 {
            return false;
        }
        if now.saturating_duration_since(self.last) < self.interval {
            return false;
        }
        self.last = now;
        true
    }
}
