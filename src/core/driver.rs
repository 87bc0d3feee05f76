//! Turns a loop's single-turn primitive into stepping or run-to-completion.

use std::thread;

use tracing::{debug, error, info};

use crate::core::error::LoopFault;
use crate::core::sched_loop::{LoopHandle, LoopStatus, SchedulerLoop};

/// Stepping wrapper around exactly one [`SchedulerLoop`].
///
/// The driver only borrows the loop, so it can never outlive it.
pub struct Driver<'a> {
    sched_loop: &'a mut SchedulerLoop,
}

/// Publishes the driving thread on the loop handle while a drive is in progress.
struct DriveGuard {
    handle: LoopHandle,
}

impl DriveGuard {
    fn enter(handle: LoopHandle) -> Self {
        handle.set_driver_thread(Some(thread::current().id()));
        Self { handle }
    }
}

impl Drop for DriveGuard {
    fn drop(&mut self) {
        self.handle.set_driver_thread(None);
    }
}

impl<'a> Driver<'a> {
    /// Wrap a loop.
    pub const fn new(sched_loop: &'a mut SchedulerLoop) -> Self {
        Self { sched_loop }
    }

    /// Perform exactly one `run_once` and return its status.
    ///
    /// # Errors
    ///
    /// Returns the loop's fault unchanged.
    pub fn step(&mut self) -> Result<LoopStatus, LoopFault> {
        let _guard = DriveGuard::enter(self.sched_loop.handle());
        self.sched_loop.run_once()
    }

    /// Drive the loop until it reports [`LoopStatus::Shutdown`].
    ///
    /// Blocks the calling thread for the loop's entire run. When the loop is
    /// idle the thread parks until new work or shutdown is signalled, waking
    /// at least every `idle_wait_ms` to re-check.
    ///
    /// # Errors
    ///
    /// Returns the first fault raised by the loop; the loop is not driven
    /// any further.
    pub fn start_main_loop(&mut self) -> Result<(), LoopFault> {
        let _guard = DriveGuard::enter(self.sched_loop.handle());
        let loop_id = self.sched_loop.loop_id();
        let idle_wait = self.sched_loop.config().idle_wait();
        info!(scheduler = %loop_id, "Main loop started");

        loop {
            match self.sched_loop.run_once() {
                Ok(LoopStatus::MoreWorkPending) => {}
                Ok(LoopStatus::Idle) => {
                    self.sched_loop.wait_for_work(idle_wait);
                }
                Ok(LoopStatus::Shutdown) => {
                    let turns = self.sched_loop.handle().stats().turns;
                    info!(scheduler = %loop_id, turns, "Main loop observed shutdown");
                    return Ok(());
                }
                Err(fault) => {
                    error!(scheduler = %loop_id, error = %fault, "Main loop terminated by fault");
                    return Err(fault);
                }
            }
            debug!(scheduler = %loop_id, "Main loop turn complete");
        }
    }
}
