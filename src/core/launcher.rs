//! Launchers decide how a scheduler loop is pumped.
//!
//! A [`Launcher`] owns exactly one [`SchedulerLoop`](crate::core::SchedulerLoop)
//! and drives it with one of two strategies:
//!
//! - [`ThreadLauncher`]: spawns a dedicated OS thread that runs the loop to
//!   completion; `start`/`join` map onto thread spawn/join.
//! - [`ManualLauncher`]: spawns nothing; `start`/`join` are no-ops and the
//!   host calls `step_to_completion` on a thread of its choosing.
//!
//! # Example
//!
//! ```rust
//! use prometheus_sched_launcher::config::{ExecutionMode, LauncherConfig};
//! use prometheus_sched_launcher::core::{LauncherFactory, ThreadLauncherFactory};
//! use prometheus_sched_launcher::util::SchedulerIdentity;
//!
//! let factory = ThreadLauncherFactory::new(LauncherConfig::new()).unwrap();
//! let mut launcher = factory.create(SchedulerIdentity::new(0), 0).unwrap();
//! assert_eq!(launcher.mode(), ExecutionMode::Thread);
//!
//! launcher.start().unwrap();
//! launcher.get_loop().spawn(|| Ok(())).unwrap();
//! launcher.get_loop().request_shutdown();
//! launcher.join().unwrap();
//! ```

mod manual;
mod thread;

use serde::{Deserialize, Serialize};

use crate::config::ExecutionMode;
use crate::core::error::LauncherError;
use crate::core::sched_loop::LoopHandle;
use crate::util::LoopId;

pub use manual::ManualLauncher;
pub use thread::ThreadLauncher;

/// Lifecycle state of a launcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LaunchState {
    /// Created, not yet started or driven.
    Unstarted,
    /// Thread spawned, or manual loop partially stepped.
    Running,
    /// Thread exited after observing shutdown; waiting for `join`.
    Joinable,
    /// Loop reached shutdown and, for threads, was joined.
    Terminated,
    /// Loop ended with a fault.
    Faulted,
    /// The launcher thread could not be spawned.
    Failed,
}

/// A scheduler loop plus its execution strategy.
#[derive(Debug)]
pub enum Launcher {
    /// Dedicated OS thread.
    Thread(ThreadLauncher),
    /// Host-driven stepping.
    Manual(ManualLauncher),
}

impl Launcher {
    /// Begin running the loop (spawns a thread, or does nothing for manual).
    ///
    /// # Errors
    ///
    /// See [`ThreadLauncher::start`]; manual launchers never fail here.
    pub fn start(&mut self) -> Result<(), LauncherError> {
        match self {
            Self::Thread(launcher) => launcher.start(),
            Self::Manual(launcher) => launcher.start(),
        }
    }

    /// Wait for the loop to finish (joins the thread, or does nothing for manual).
    ///
    /// # Errors
    ///
    /// See [`ThreadLauncher::join`]; manual launchers never fail here.
    pub fn join(&mut self) -> Result<(), LauncherError> {
        match self {
            Self::Thread(launcher) => launcher.join(),
            Self::Manual(launcher) => launcher.join(),
        }
    }

    /// Read-only handle for diagnostics, shutdown requests, and queueing work.
    #[must_use]
    pub const fn get_loop(&self) -> &LoopHandle {
        match self {
            Self::Thread(launcher) => launcher.get_loop(),
            Self::Manual(launcher) => launcher.get_loop(),
        }
    }

    /// Loop identity.
    #[must_use]
    pub fn loop_id(&self) -> LoopId {
        match self {
            Self::Thread(launcher) => launcher.loop_id(),
            Self::Manual(launcher) => launcher.loop_id(),
        }
    }

    /// Execution strategy of this launcher.
    #[must_use]
    pub const fn mode(&self) -> ExecutionMode {
        match self {
            Self::Thread(_) => ExecutionMode::Thread,
            Self::Manual(_) => ExecutionMode::Manual,
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> LaunchState {
        match self {
            Self::Thread(launcher) => launcher.state(),
            Self::Manual(launcher) => launcher.state(),
        }
    }

    /// The manual launcher, when this is one.
    pub fn as_manual_mut(&mut self) -> Option<&mut ManualLauncher> {
        match self {
            Self::Manual(launcher) => Some(launcher),
            Self::Thread(_) => None,
        }
    }
}
