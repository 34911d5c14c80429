//! File actions module.
//!
//! This module removes what a scan flagged:
//! - Subdirectories of the target folder (recursively)
//! - Files with a delete verdict
//! - Optionally via the system trash instead of permanent removal
//!
//! ```no_run
//! use pixel_mage::actions::{DeleteConfig, DeletionCandidate, DeletionExecutor};
//! use std::path::Path;
//!
//! let executor = DeletionExecutor::new(Path::new("/wallpapers"), DeleteConfig::trash());
//! executor.execute(&[DeletionCandidate::directory("thumbs")], None);
//! ```

pub mod delete;

// Re-export commonly used types
pub use delete::{
    delete_to_trash, permanent_delete, permanent_delete_dir, BatchDeleteResult, DeleteConfig,
    DeleteError, DeleteObserver, DeleteResult, DeletionCandidate, DeletionExecutor,
};
