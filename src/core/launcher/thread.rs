//! Thread-backed launcher: one dedicated OS thread per scheduler loop.
//!
//! The loop is moved into the spawned thread on `start` and handed back
//! through the join handle, so only that thread ever calls `run_once` while
//! it is running. Callers keep a [`LoopHandle`] for shutdown and diagnostics.

use std::fmt;
use std::thread::{self, JoinHandle};

use tracing::{debug, error, info, warn};

use crate::config::LauncherConfig;
use crate::core::driver::Driver;
use crate::core::error::{LauncherError, LoopFault, Violation};
use crate::core::sched_loop::{panic_message, LoopHandle, SchedulerLoop};
use crate::util::LoopId;

use super::LaunchState;

/// What the launcher thread hands back when it exits.
type LoopOutcome = (SchedulerLoop, Result<(), LoopFault>);

/// Launcher that runs its loop on a dedicated native thread.
pub struct ThreadLauncher {
    loop_id: LoopId,
    handle: LoopHandle,
    /// Present while unstarted and again after a successful join.
    sched_loop: Option<SchedulerLoop>,
    thread: Option<JoinHandle<LoopOutcome>>,
    state: LaunchState,
    thread_name: String,
    stack_size: Option<usize>,
}

impl ThreadLauncher {
    /// Wrap a loop; no thread is spawned until [`start`](Self::start).
    #[must_use]
    pub fn new(sched_loop: SchedulerLoop, config: &LauncherConfig) -> Self {
        let loop_id = sched_loop.loop_id();
        Self {
            loop_id,
            handle: sched_loop.handle(),
            sched_loop: Some(sched_loop),
            thread: None,
            state: LaunchState::Unstarted,
            thread_name: format!(
                "{}-{}-{}",
                config.thread_name_prefix,
                loop_id.scheduler.get(),
                loop_id.index
            ),
            stack_size: config.thread_stack_size,
        }
    }

    /// Loop identity.
    #[must_use]
    pub const fn loop_id(&self) -> LoopId {
        self.loop_id
    }

    /// Handle onto the owned loop, valid whether or not the thread runs.
    #[must_use]
    pub const fn get_loop(&self) -> &LoopHandle {
        &self.handle
    }

    /// Name given to the launcher thread.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.thread_name
    }

    /// Current lifecycle state. Reports `Joinable` once the thread has exited.
    #[must_use]
    pub fn state(&self) -> LaunchState {
        match (&self.state, &self.thread) {
            (LaunchState::Running, Some(thread)) if thread.is_finished() => LaunchState::Joinable,
            (state, _) => *state,
        }
    }

    /// Spawn the launcher thread, which drives the loop until shutdown.
    ///
    /// # Errors
    ///
    /// - `LauncherError::Precondition` if the launcher is not unstarted
    /// - `LauncherError::Registration` if the OS refuses to create the thread;
    ///   the launcher moves to `Failed` and the scheduler never runs
    pub fn start(&mut self) -> Result<(), LauncherError> {
        if self.state != LaunchState::Unstarted {
            return Err(self.violation(Violation::StartedTwice));
        }
        let Some(mut sched_loop) = self.sched_loop.take() else {
            return Err(self.violation(Violation::StartedTwice));
        };

        let mut builder = thread::Builder::new().name(self.thread_name.clone());
        if let Some(size) = self.stack_size {
            builder = builder.stack_size(size);
        }

        let spawned = builder.spawn(move || {
            debug!(scheduler = %sched_loop.loop_id(), "Launcher thread started");
            let result = Driver::new(&mut sched_loop).start_main_loop();
            debug!(scheduler = %sched_loop.loop_id(), "Launcher thread exiting");
            (sched_loop, result)
        });

        match spawned {
            Ok(thread) => {
                self.thread = Some(thread);
                self.state = LaunchState::Running;
                info!(
                    scheduler = %self.loop_id,
                    thread = %self.thread_name,
                    "Launcher thread spawned"
                );
                Ok(())
            }
            Err(source) => {
                self.state = LaunchState::Failed;
                error!(scheduler = %self.loop_id, error = %source, "Failed to spawn launcher thread");
                Err(LauncherError::Registration {
                    scheduler: self.loop_id,
                    source,
                })
            }
        }
    }

    /// Block until the launcher thread has observed shutdown and exited.
    ///
    /// Call once, after a successful `start`.
    ///
    /// # Errors
    ///
    /// - `LauncherError::Precondition` if called before a successful `start`
    ///   or after the launcher was already joined
    /// - `LauncherError::LoopFault` if the loop faulted or the thread panicked
    pub fn join(&mut self) -> Result<(), LauncherError> {
        match self.state {
            LaunchState::Unstarted | LaunchState::Failed => {
                return Err(self.violation(Violation::JoinBeforeStart));
            }
            LaunchState::Terminated | LaunchState::Faulted => {
                return Err(self.violation(Violation::JoinedTwice));
            }
            LaunchState::Running | LaunchState::Joinable => {}
        }
        let Some(thread) = self.thread.take() else {
            return Err(self.violation(Violation::JoinBeforeStart));
        };

        debug!(scheduler = %self.loop_id, "Joining launcher thread");
        let fault = match thread.join() {
            Ok((sched_loop, result)) => {
                self.sched_loop = Some(sched_loop);
                match result {
                    Ok(()) => {
                        self.state = LaunchState::Terminated;
                        info!(scheduler = %self.loop_id, "Launcher thread joined");
                        return Ok(());
                    }
                    Err(fault) => fault,
                }
            }
            Err(payload) => LoopFault::ThreadPanicked(panic_message(payload.as_ref())),
        };

        self.state = LaunchState::Faulted;
        error!(scheduler = %self.loop_id, error = %fault, "Launcher thread terminated with fault");
        Err(LauncherError::LoopFault {
            scheduler: self.loop_id,
            fault,
        })
    }

    fn violation(&self, violation: Violation) -> LauncherError {
        LauncherError::Precondition {
            scheduler: self.loop_id,
            violation,
        }
    }
}

impl fmt::Debug for ThreadLauncher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThreadLauncher")
            .field("loop_id", &self.loop_id)
            .field("state", &self.state())
            .field("thread_name", &self.thread_name)
            .finish_non_exhaustive()
    }
}

impl Drop for ThreadLauncher {
    fn drop(&mut self) {
        // Never join in Drop; a stuck task would hang the dropping thread.
        if self.thread.is_some() {
            self.handle.request_shutdown();
            warn!(
                scheduler = %self.loop_id,
                "ThreadLauncher dropped without join - thread detached after shutdown request"
            );
        }
    }
}
