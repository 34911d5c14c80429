//! pixel_mage - wallpaper folder cleaner
//!
//! Walks one folder, removes its subdirectories, placeholder images (by
//! content digest) and images below a minimum resolution, and caches every
//! verdict so later runs only look at new files.

pub mod actions;
pub mod cache;
pub mod classifier;
pub mod cli;
pub mod config;
pub mod error;
pub mod error_log;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod sweep;

use std::sync::Arc;

use anyhow::Context;

use crate::cli::Cli;
use crate::config::{Config, Settings};
use crate::error::ExitCode;
use crate::progress::{Progress, ProgressCallback};
use crate::signal::{install_handler, ShutdownCoordinator};
use crate::sweep::Sweeper;

/// Run the application for parsed command-line arguments.
///
/// # Errors
///
/// Returns an error for invalid configuration, a failure to install the
/// signal hook, or any [`sweep::SweepError`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let mut settings =
        Settings::load(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_to(&mut settings);
    let config = Config::from_settings(settings).context("Invalid configuration")?;
    log::debug!("Running with {:?}", config);

    let coordinator = ShutdownCoordinator::new().with_grace_period(config.grace_period);
    install_handler(&coordinator)?;

    // Console log lines would tear through the bar, so it only shows when they are off.
    let progress: Arc<dyn ProgressCallback> =
        Arc::new(Progress::new(cli.quiet || config.run_log.display));

    let mut sweeper = Sweeper::from_config(&config)
        .with_shutdown(coordinator)
        .with_progress(progress);
    let report = sweeper.run()?;

    log::info!("{}", report.summary());
    if let Some(path) = &report.error_log {
        log::info!("Error details written to {}", path.display());
    }
    Ok(ExitCode::Success)
}
