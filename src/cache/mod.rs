//! Verdict caching module for pixel_mage.
//!
//! This module persists the keep/delete verdict of every examined file so
//! later runs over the same folder skip files they have already judged.
//!
//! # Architecture
//!
//! * [`entry`]: The on-disk JSON document ([`CacheFile`]) and its metadata.
//! * [`store`]: [`VerdictCache`], the in-memory map with load/save/prune.
//!
//! # Cache Invalidation
//!
//! There is none beyond the filename: an entry present in the cache is
//! trusted verbatim. Entries only disappear when a clean run prunes the
//! delete verdicts (those files are gone from disk by then), or when the
//! whole file is rejected on load (invalid JSON, unknown version).

pub mod entry;
pub mod store;

pub use entry::{CacheFile, CacheMeta, LastExit, CACHE_VERSION, NEW_CACHE};
pub use store::{CacheError, CacheResult, VerdictCache};
