//! Manual launcher: no thread, the host drives the loop on its own thread.

use std::fmt;

use tracing::{debug, error, info};

use crate::core::driver::Driver;
use crate::core::error::{LauncherError, LoopFault, Violation};
use crate::core::sched_loop::{LoopHandle, LoopStatus, SchedulerLoop};
use crate::util::LoopId;

use super::LaunchState;

/// Launcher whose loop is pumped by the host via [`step`](Self::step) or
/// [`step_to_completion`](Self::step_to_completion).
///
/// `start` and `join` are no-ops kept for the shared launcher surface.
pub struct ManualLauncher {
    sched_loop: SchedulerLoop,
    handle: LoopHandle,
    state: LaunchState,
}

impl ManualLauncher {
    /// Wrap a loop.
    #[must_use]
    pub fn new(sched_loop: SchedulerLoop) -> Self {
        Self {
            handle: sched_loop.handle(),
            sched_loop,
            state: LaunchState::Unstarted,
        }
    }

    /// Loop identity.
    #[must_use]
    pub fn loop_id(&self) -> LoopId {
        self.sched_loop.loop_id()
    }

    /// Handle onto the owned loop.
    #[must_use]
    pub const fn get_loop(&self) -> &LoopHandle {
        &self.handle
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> LaunchState {
        self.state
    }

    /// No-op: manual loops have no thread to start.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` to match the thread-backed launcher.
    pub fn start(&self) -> Result<(), LauncherError> {
        debug!(scheduler = %self.loop_id(), "Manual launcher start is a no-op");
        Ok(())
    }

    /// No-op: the host must drive the loop to completion itself.
    ///
    /// # Errors
    ///
    /// Never fails; returns `Result` to match the thread-backed launcher.
    pub fn join(&self) -> Result<(), LauncherError> {
        debug!(scheduler = %self.loop_id(), "Manual launcher join is a no-op");
        Ok(())
    }

    /// Run exactly one loop turn on the calling thread.
    ///
    /// A [`LoopStatus::Shutdown`] result terminates the launcher.
    ///
    /// # Errors
    ///
    /// - `LauncherError::Precondition` if the launcher already terminated
    /// - `LauncherError::LoopFault` if the turn faulted
    pub fn step(&mut self) -> Result<LoopStatus, LauncherError> {
        self.ensure_drivable()?;
        let result = Driver::new(&mut self.sched_loop).step();
        match result {
            Ok(LoopStatus::Shutdown) => {
                self.state = LaunchState::Terminated;
                info!(scheduler = %self.loop_id(), "Manual loop reached shutdown");
                Ok(LoopStatus::Shutdown)
            }
            Ok(status) => {
                self.state = LaunchState::Running;
                Ok(status)
            }
            Err(fault) => Err(self.fault(fault)),
        }
    }

    /// Drive the loop on the calling thread until it observes shutdown.
    ///
    /// # Errors
    ///
    /// - `LauncherError::Precondition` if the launcher already terminated
    /// - `LauncherError::LoopFault` if the loop faulted
    pub fn step_to_completion(&mut self) -> Result<(), LauncherError> {
        self.ensure_drivable()?;
        self.state = LaunchState::Running;
        let result = Driver::new(&mut self.sched_loop).start_main_loop();
        match result {
            Ok(()) => {
                self.state = LaunchState::Terminated;
                info!(scheduler = %self.loop_id(), "Manual loop driven to completion");
                Ok(())
            }
            Err(fault) => Err(self.fault(fault)),
        }
    }

    fn ensure_drivable(&self) -> Result<(), LauncherError> {
        match self.state {
            LaunchState::Terminated | LaunchState::Faulted => Err(LauncherError::Precondition {
                scheduler: self.loop_id(),
                violation: Violation::DriveAfterTermination,
            }),
            _ => Ok(()),
        }
    }

    fn fault(&mut self, fault: LoopFault) -> LauncherError {
        self.state = LaunchState::Faulted;
        error!(scheduler = %self.loop_id(), error = %fault, "Manual loop terminated with fault");
        LauncherError::LoopFault {
            scheduler: self.loop_id(),
            fault,
        }
    }
}

impl fmt::Debug for ManualLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualLauncher")
            .field("loop_id", &self.loop_id())
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}
