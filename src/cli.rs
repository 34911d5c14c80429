//! Command-line interface definitions for pixel_mage.
//!
//! This module defines all CLI arguments using the clap derive API. Flags are
//! the last configuration layer: every flag left out keeps the value from the
//! config file, the environment or the defaults.
//!
//! # Example
//!
//! ```bash
//! # Clean the current directory with default thresholds
//! pixel_mage
//!
//! # Clean a folder, moving rejects to the trash
//! pixel_mage ~/Pictures/wallpapers --trash
//!
//! # Stricter thresholds and a placeholder hash, without a cache
//! pixel_mage ~/wallpapers --min-width 2560 --min-height 1440 \
//!     --remove-hash 0123456789abcdef0123456789abcdef --no-cache
//! ```

use std::path::PathBuf;

use clap::Parser;

use crate::classifier::DigestAlgorithm;
use crate::config::{CacheSetting, Settings};

/// Removes low-resolution and placeholder images from a wallpaper folder.
///
/// Every file directly inside TARGET is checked: small files are compared
/// against a list of known placeholder digests, larger ones must reach the
/// minimum resolution. Subdirectories are removed. Verdicts are cached so
/// later runs only look at new files.
#[derive(Debug, Parser)]
#[command(name = "pixel_mage")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Folder to clean (default: current directory)
    #[arg(value_name = "TARGET")]
    pub target: Option<PathBuf>,

    /// Read settings from this TOML file instead of the default location
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Name of the metadata folder inside TARGET
    #[arg(short = 'f', long, value_name = "NAME")]
    pub app_folder: Option<String>,

    /// Store the verdict cache at this path
    #[arg(short = 'c', long, value_name = "PATH", conflicts_with = "no_cache")]
    pub cache: Option<PathBuf>,

    /// Disable the verdict cache
    #[arg(long)]
    pub no_cache: bool,

    /// Disable the run log entirely
    #[arg(long)]
    pub no_log: bool,

    /// Do not show run-log lines on the console
    #[arg(long)]
    pub no_display_log: bool,

    /// Do not write the run-log file
    #[arg(long)]
    pub no_file_log: bool,

    /// Disable error records entirely
    #[arg(long)]
    pub no_errors: bool,

    /// Do not show error records on the console
    #[arg(long)]
    pub no_display_errors: bool,

    /// Do not write the error-log file
    #[arg(long)]
    pub no_file_errors: bool,

    /// Digest of a placeholder image to delete (can be specified multiple times)
    #[arg(long = "remove-hash", value_name = "HASH")]
    pub remove_hashes: Vec<String>,

    /// Minimum image width in pixels
    #[arg(long, value_name = "PX")]
    pub min_width: Option<u32>,

    /// Minimum image height in pixels
    #[arg(long, value_name = "PX")]
    pub min_height: Option<u32>,

    /// Digest algorithm used for placeholder detection
    #[arg(long, value_enum)]
    pub digest: Option<DigestAlgorithm>,

    /// Move rejected entries to the system trash instead of deleting them
    #[arg(long)]
    pub trash: bool,

    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Overlay the flags that were given onto `settings`.
    ///
    /// `--remove-hash` values are added to the configured list.
    pub fn apply_to(&self, settings: &mut Settings) {
        if let Some(target) = &self.target {
            settings.target = target.clone();
        }
        if let Some(app_folder) = &self.app_folder {
            settings.app_folder = app_folder.clone();
        }
        if let Some(cache) = &self.cache {
            settings.cache = CacheSetting::Path(cache.clone());
        }
        if self.no_cache {
            settings.cache = CacheSetting::Enabled(false);
        }

        if self.no_log {
            settings.log = false;
        }
        if self.no_display_log {
            settings.display_log = false;
        }
        if self.no_file_log {
            settings.file_log = false;
        }
        if self.no_errors {
            settings.errors = false;
        }
        if self.no_display_errors {
            settings.display_errors = false;
        }
        if self.no_file_errors {
            settings.file_errors = false;
        }

        settings
            .images_to_remove
            .extend(self.remove_hashes.iter().cloned());
        if let Some(width) = self.min_width {
            settings.min_width = width;
        }
        if let Some(height) = self.min_height {
            settings.min_height = height;
        }
        if let Some(digest) = self.digest {
            settings.digest = digest;
        }
        if self.trash {
            settings.trash = true;
        }
    }
}
