//! Application configuration management.
//!
//! # Overview
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. A TOML file: `--config <PATH>`, else `config.toml` in the platform
//!    config directory (when present)
//! 3. Environment variables prefixed with `PIXEL_MAGE_`
//! 4. Command-line flags (applied by [`crate::cli::Cli::apply_to`])
//!
//! The merged [`Settings`] are then validated once into a [`Config`], the
//! only configuration type the sweep sees.
//!
//! # Example
//!
//! ```toml
//! app_folder = ".pixel_mage"
//! cache = true
//! min_width = 2560
//! min_height = 1440
//! images_to_remove = ["0123456789abcdef0123456789abcdef"]
//! ```

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::actions::DeleteConfig;
use crate::classifier::{ClassifierRules, DigestAlgorithm};
use crate::logging::LogOutputs;

/// Name of the metadata folder created inside the target folder.
pub const DEFAULT_APP_FOLDER: &str = ".pixel_mage";

/// File name of the cache inside the metadata folder.
pub const CACHE_FILE_NAME: &str = ".cache.json";

/// Prefix of environment variables read as settings.
pub const ENV_PREFIX: &str = "PIXEL_MAGE_";

/// Configuration errors. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Settings could not be merged or deserialized.
    #[error("Invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),

    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    MissingFile(PathBuf),

    /// The target folder does not exist.
    #[error("Target folder not found: {0}")]
    TargetNotFound(PathBuf),

    /// The target is not a folder.
    #[error("Target is not a directory: {0}")]
    TargetNotADirectory(PathBuf),

    /// The app folder is not a plain folder name.
    #[error("App folder must be a single folder name, got {0:?}")]
    InvalidAppFolder(String),

    /// A dimension threshold is zero.
    #[error("{name} must be greater than zero")]
    InvalidThreshold {
        /// Setting name
        name: &'static str,
    },

    /// A known-bad hash is not a digest of the configured algorithm.
    #[error("{hash:?} is not a valid {algorithm} digest")]
    InvalidDigest {
        /// The offending entry
        hash: String,
        /// Configured algorithm
        algorithm: DigestAlgorithm,
    },
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Figment(Box::new(e))
    }
}

/// Cache location: on, off, or an explicit file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CacheSetting {
    /// `true` uses the default location inside the app folder.
    Enabled(bool),
    /// Explicit cache file path.
    Path(PathBuf),
}

impl Default for CacheSetting {
    fn default() -> Self {
        Self::Enabled(true)
    }
}

/// Raw, mergeable settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Folder to clean.
    pub target: PathBuf,
    /// Metadata folder name inside the target; never deleted.
    pub app_folder: String,
    /// Cache location.
    pub cache: CacheSetting,
    /// Master switch for the run log.
    pub log: bool,
    /// Show run-log lines on the console.
    pub display_log: bool,
    /// Write the run-log file.
    pub file_log: bool,
    /// Master switch for error records.
    pub errors: bool,
    /// Echo error records on the console.
    pub display_errors: bool,
    /// Write the error-log file.
    pub file_errors: bool,
    /// Digests of placeholder images to delete.
    pub images_to_remove: Vec<String>,
    /// Minimum acceptable width.
    pub min_width: u32,
    /// Minimum acceptable height.
    pub min_height: u32,
    /// Digest algorithm for small files.
    pub digest: DigestAlgorithm,
    /// Move to trash instead of deleting.
    pub trash: bool,
    /// Minimum seconds between checkpoints.
    pub checkpoint_interval_secs: u64,
    /// Milliseconds granted for teardown after a signal.
    pub grace_period_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: PathBuf::from("."),
            app_folder: DEFAULT_APP_FOLDER.to_string(),
            cache: CacheSetting::default(),
            log: true,
            display_log: true,
            file_log: true,
            errors: true,
            display_errors: true,
            file_errors: true,
            images_to_remove: Vec::new(),
            min_width: 1920,
            min_height: 1080,
            digest: DigestAlgorithm::default(),
            trash: false,
            checkpoint_interval_secs: 5,
            grace_period_ms: 300,
        }
    }
}

impl Settings {
    /// Merge defaults, the TOML file and the environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingFile`] when `config_file` is given but
    /// absent, or [`ConfigError::Figment`] on malformed input.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_file {
            Some(path) if !path.is_file() => {
                return Err(ConfigError::MissingFile(path.to_path_buf()))
            }
            Some(path) => Some(path.to_path_buf()),
            None => default_config_path(),
        };
        Self::figment(file.as_deref())
            .merge(Env::prefixed(ENV_PREFIX))
            .extract()
            .map_err(ConfigError::from)
    }

    /// Defaults merged with an optional TOML file, without the environment.
    #[must_use]
    pub fn figment(config_file: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Self::default()));
        match config_file {
            Some(path) => {
                log::debug!("Reading settings from {}", path.display());
                figment.merge(Toml::file(path))
            }
            None => figment,
        }
    }
}

/// Platform config file, `<config dir>/config.toml`.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    ProjectDirs::from("com", "pixel_mage", "pixel_mage")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Validated configuration of one run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Folder to clean.
    pub target: PathBuf,
    /// Metadata folder name inside the target.
    pub app_folder: String,
    /// Cache file, `None` when caching is off.
    pub cache_path: Option<PathBuf>,
    /// Run-log destinations.
    pub run_log: LogOutputs,
    /// Error-log destinations.
    pub error_log: LogOutputs,
    /// Classification thresholds and known-bad digests.
    pub rules: ClassifierRules,
    /// Digest algorithm for small files.
    pub digest: DigestAlgorithm,
    /// Deletion mode.
    pub delete: DeleteConfig,
    /// Minimum time between checkpoints.
    pub checkpoint_interval: Duration,
    /// Teardown time granted after a signal.
    pub grace_period: Duration,
}

impl Config {
    /// Validate `settings`.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let target = settings.target;
        if !target.exists() {
            return Err(ConfigError::TargetNotFound(target));
        }
        if !target.is_dir() {
            return Err(ConfigError::TargetNotADirectory(target));
        }

        if !is_single_component(&settings.app_folder) {
            return Err(ConfigError::InvalidAppFolder(settings.app_folder));
        }
        if settings.min_width == 0 {
            return Err(ConfigError::InvalidThreshold { name: "min_width" });
        }
        if settings.min_height == 0 {
            return Err(ConfigError::InvalidThreshold { name: "min_height" });
        }

        let mut hashes = Vec::with_capacity(settings.images_to_remove.len());
        for hash in settings.images_to_remove {
            let normalized = hash.trim().to_ascii_lowercase();
            if !settings.digest.is_valid_hex(&normalized) {
                return Err(ConfigError::InvalidDigest {
                    hash,
                    algorithm: settings.digest,
                });
            }
            hashes.push(normalized);
        }

        let app_dir = target.join(&settings.app_folder);
        let cache_path = match settings.cache {
            CacheSetting::Enabled(false) => None,
            CacheSetting::Enabled(true) => Some(app_dir.join(CACHE_FILE_NAME)),
            CacheSetting::Path(path) => Some(path),
        };

        Ok(Self {
            target,
            app_folder: settings.app_folder,
            cache_path,
            run_log: LogOutputs {
                enabled: settings.log,
                display: settings.display_log,
                file: settings.file_log,
            },
            error_log: LogOutputs {
                enabled: settings.errors,
                display: settings.display_errors,
                file: settings.file_errors,
            },
            rules: ClassifierRules::new(settings.min_width, settings.min_height)
                .with_known_bad_hashes(hashes),
            digest: settings.digest,
            delete: DeleteConfig {
                trash: settings.trash,
            },
            checkpoint_interval: Duration::from_secs(settings.checkpoint_interval_secs),
            grace_period: Duration::from_millis(settings.grace_period_ms),
        })
    }

    /// Metadata folder inside the target.
    #[must_use]
    pub fn app_dir(&self) -> PathBuf {
        self.target.join(&self.app_folder)
    }
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
