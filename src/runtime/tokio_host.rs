//! Tokio host adapter: blocking launcher calls moved off the async executor.
//!
//! `join` and `step_to_completion` block for a loop's whole run. An async
//! host hands them to tokio's blocking pool instead, and can bound the wait
//! with `tokio::time::timeout` if it wants one.

use crate::core::{Launcher, LauncherError, ManualLauncher};

/// A launcher returned from a blocking call, with that call's result.
#[derive(Debug)]
pub struct Completed<L> {
    /// The launcher, handed back for inspection or drop.
    pub launcher: L,
    /// Outcome of the blocking call.
    pub result: Result<(), LauncherError>,
}

/// Runs blocking launcher calls on a tokio runtime's blocking pool.
#[derive(Clone)]
pub struct TokioHost {
    handle: tokio::runtime::Handle,
}

impl TokioHost {
    /// Create a host from a tokio runtime handle.
    #[must_use]
    pub const fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Create a host on the runtime of the current async context.
    ///
    /// # Panics
    ///
    /// Panics if called outside a tokio runtime.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }

    /// Join a launcher without blocking the async executor.
    ///
    /// # Errors
    ///
    /// Returns the `JoinError` if the blocking task was cancelled or panicked;
    /// the launcher is lost in that case.
    pub async fn join(&self, mut launcher: Launcher) -> Result<Completed<Launcher>, tokio::task::JoinError> {
        self.handle
            .spawn_blocking(move || {
                let result = launcher.join();
                Completed { launcher, result }
            })
            .await
    }

    /// Drive a manual launcher to completion on a blocking-pool thread.
    ///
    /// # Errors
    ///
    /// Returns the `JoinError` if the blocking task was cancelled or panicked.
    pub async fn step_to_completion(
        &self,
        mut launcher: ManualLauncher,
    ) -> Result<Completed<ManualLauncher>, tokio::task::JoinError> {
        self.handle
            .spawn_blocking(move || {
                let result = launcher.step_to_completion();
                Completed { launcher, result }
            })
            .await
    }
}
