//! Signal handling for graceful shutdown.
//!
//! The [`ShutdownCoordinator`] is a small state machine shared between the
//! sweep and the signal handler thread:
//!
//! ```text
//! Running --signal--> ShuttingDown --mark_exited--> Exited
//!                          |
//!                          +--signal or grace timer--> exit(130)
//! ```
//!
//! - The first signal moves to `ShuttingDown`, prints a notice and starts the
//!   grace timer. The sweep notices at its next poll, saves the cache
//!   without pruning, flushes its logs and marks the coordinator `Exited`.
//! - If the timer fires before that, or a second signal arrives, the exit
//!   action runs with code 130.
//! - Once `Exited`, signals are ignored.
//!
//! The exit action defaults to [`std::process::exit`] and can be replaced so
//! tests observe forced exits instead of dying.
//!
//! # Usage
//!
//! ```rust,no_run
//! use pixel_mage::signal::{install_handler, ShutdownCoordinator};
//!
//! let coordinator = ShutdownCoordinator::new();
//! install_handler(&coordinator).expect("Failed to install signal handler");
//!
//! if coordinator.is_shutdown_requested() {
//!     // save what we have, then
//!     coordinator.mark_exited();
//! }
//! ```

use std::fmt;
use std::io::Write;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};
use std::thread;
use std::time::Duration;

/// Exit code for SIGINT (Ctrl+C) interruption.
/// This follows Unix convention: 128 + signal number (SIGINT = 2).
pub const EXIT_CODE_INTERRUPTED: i32 = 130;

/// Default time the sweep gets to tear down before a forced exit.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_millis(300);

const RUNNING: u8 = 0;
const SHUTTING_DOWN: u8 = 1;
const EXITED: u8 = 2;

/// Process-exit action invoked with the exit code.
pub type ExitAction = Arc<dyn Fn(i32) + Send + Sync>;

/// Where the coordinator is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// No signal received.
    Running,
    /// A signal was received; teardown is pending.
    ShuttingDown,
    /// Teardown finished; further signals are ignored.
    Exited,
}

impl ShutdownState {
    fn from_raw(raw: u8) -> Self {
        match raw {
            RUNNING => Self::Running,
            SHUTTING_DOWN => Self::ShuttingDown,
            _ => Self::Exited,
        }
    }
}

/// Shared shutdown state machine.
///
/// Clones share the same state; hand one to the sweep and keep one for the
/// signal hook.
#[derive(Clone)]
pub struct ShutdownCoordinator {
    state: Arc<AtomicU8>,
    grace_period: Duration,
    exit: ExitAction,
}

impl fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("state", &self.state())
            .field("grace_period", &self.grace_period)
            .finish_non_exhaustive()
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownCoordinator {
    /// Create a coordinator in the `Running` state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(RUNNING)),
            grace_period: DEFAULT_GRACE_PERIOD,
            exit: Arc::new(|code| std::process::exit(code)),
        }
    }

    /// Set the grace period between the first signal and a forced exit.
    #[must_use]
    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Replace the process-exit action.
    #[must_use]
    pub fn with_exit_action(mut self, exit: ExitAction) -> Self {
        self.exit = exit;
        self
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> ShutdownState {
        ShutdownState::from_raw(self.state.load(Ordering::SeqCst))
    }

    /// Whether a signal has been received.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        self.state.load(Ordering::SeqCst) != RUNNING
    }

    /// Configured grace period.
    #[must_use]
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    /// Deliver one termination signal.
    pub fn signal(&self) {
        match self
            .state
            .compare_exchange(RUNNING, SHUTTING_DOWN, Ordering::SeqCst, Ordering::SeqCst)
        {
            Ok(_) => {
                let _ = writeln!(
                    std::io::stderr(),
                    "\nInterrupted. Cleaning up... to exit immediately press Ctrl+C again"
                );
                let _ = std::io::stderr().flush();
                log::info!("Shutdown signal received");
                self.start_grace_timer();
            }
            Err(SHUTTING_DOWN) => {
                log::debug!("Second signal received, exiting immediately");
                (self.exit)(EXIT_CODE_INTERRUPTED);
            }
            Err(_) => log::debug!("Signal ignored after teardown"),
        }
    }

    /// Record that teardown finished; cancels a pending forced exit.
    pub fn mark_exited(&self) {
        self.state.store(EXITED, Ordering::SeqCst);
    }

    fn start_grace_timer(&self) {
        let state = Arc::clone(&self.state);
        let exit = Arc::clone(&self.exit);
        let grace = self.grace_period;
        thread::spawn(move || {
            thread::sleep(grace);
            if state.load(Ordering::SeqCst) != EXITED {
                log::debug!("Grace period of {:?} elapsed, forcing exit", grace);
                exit(EXIT_CODE_INTERRUPTED);
            }
        });
    }
}

/// Error type for signal handler installation.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    /// Failed to install the Ctrl+C handler.
    #[error("Failed to install signal handler: {0}")]
    InstallFailed(#[from] ctrlc::Error),
}

static HOOKED: OnceLock<()> = OnceLock::new();
static ACTIVE: Mutex<Option<ShutdownCoordinator>> = Mutex::new(None);

fn forward_signal() {
    let active = ACTIVE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some(coordinator) = active {
        coordinator.signal();
    }
}

/// Route SIGINT, SIGTERM and SIGHUP to `coordinator`.
///
/// The OS hook is registered once per process; later calls only swap the
/// coordinator signals are forwarded to, so repeated runs in one process
/// (tests) do not fail.
///
/// # Errors
///
/// Returns [`SignalError::InstallFailed`] when the hook cannot be registered.
pub fn install_handler(coordinator: &ShutdownCoordinator) -> Result<(), SignalError> {
    if HOOKED.get().is_none() {
        match ctrlc::set_handler(forward_signal) {
            Ok(()) => {}
            Err(ctrlc::Error::MultipleHandlers) => {
                log::debug!("Ctrl+C handler already registered, reusing it");
            }
            Err(e) => return Err(SignalError::InstallFailed(e)),
        }
        let _ = HOOKED.set(());
    }

    *ACTIVE.lock().unwrap_or_else(PoisonError::into_inner) = Some(coordinator.clone());
    Ok(())
}
