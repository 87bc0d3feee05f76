//! Runtime kernel: registers schedulers and controls their launchers.
//!
//! Each scheduler is a group of loops, one launcher per loop, all built by
//! the kernel's single active [`LauncherFactory`]. The kernel holds the only
//! long-lived reference to every launcher; a scheduler's launchers are
//! destroyed when [`Kernel::join`] removes it.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use tracing::{debug, info, warn};

use crate::builders::{build_factory, build_launchers};
use crate::config::{ExecutionMode, RuntimeConfig};
use crate::core::{
    AppResult, KernelError, LaunchState, Launcher, LauncherError, LauncherFactory, LoopStats,
    SpawnError, TaskFailure, Violation,
};
use crate::util::{SchedulerIdentity, TaskId};

struct SchedulerEntry {
    launchers: Vec<Launcher>,
    /// Round-robin cursor for `spawn`.
    next_loop: AtomicUsize,
}

/// Owner of every scheduler launcher in a runtime process.
pub struct Kernel {
    config: RuntimeConfig,
    factory: Box<dyn LauncherFactory>,
    schedulers: BTreeMap<SchedulerIdentity, SchedulerEntry>,
    next_identity: u32,
}

impl Kernel {
    /// Create a kernel whose factory is chosen by `config.launcher.mode`.
    ///
    /// # Errors
    ///
    /// `LauncherError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: RuntimeConfig) -> Result<Self, LauncherError> {
        let factory = build_factory(&config)?;
        Ok(Self::with_factory(config, factory))
    }

    /// Create a kernel around an explicit factory.
    #[must_use]
    pub fn with_factory(config: RuntimeConfig, factory: Box<dyn LauncherFactory>) -> Self {
        info!(mode = ?factory.mode(), default_threads = config.default_threads, "Kernel initialized");
        Self {
            config,
            factory,
            schedulers: BTreeMap::new(),
            next_identity: 0,
        }
    }

    /// Create a kernel from `.env` and `SCHED_*` environment variables.
    ///
    /// # Errors
    ///
    /// Fails if the environment holds an invalid configuration.
    pub fn from_env() -> AppResult<Self> {
        let config = RuntimeConfig::from_env()
            .map_err(anyhow::Error::msg)
            .context("loading runtime configuration from environment")?;
        Self::new(config).context("building launcher factory")
    }

    /// Execution mode of every launcher this kernel creates.
    #[must_use]
    pub fn mode(&self) -> ExecutionMode {
        self.factory.mode()
    }

    /// Configuration in effect.
    #[must_use]
    pub const fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of registered schedulers.
    #[must_use]
    pub fn scheduler_count(&self) -> usize {
        self.schedulers.len()
    }

    /// Number of loops in a scheduler.
    #[must_use]
    pub fn loop_count(&self, identity: SchedulerIdentity) -> Option<usize> {
        self.schedulers.get(&identity).map(|entry| entry.launchers.len())
    }

    /// Register a scheduler with `threads` loops; `0` uses `default_threads`.
    ///
    /// # Errors
    ///
    /// Propagates the factory's registration failure; nothing is registered.
    pub fn create_scheduler(&mut self, threads: usize) -> Result<SchedulerIdentity, KernelError> {
        let count = if threads == 0 {
            self.config.default_threads
        } else {
            threads
        };
        let identity = SchedulerIdentity::new(self.next_identity);
        let launchers = build_launchers(self.factory.as_ref(), identity, count)?;
        self.next_identity += 1;

        self.schedulers.insert(
            identity,
            SchedulerEntry {
                launchers,
                next_loop: AtomicUsize::new(0),
            },
        );
        info!(scheduler = %identity, loops = count, mode = ?self.mode(), "Scheduler registered");
        Ok(identity)
    }

    /// Start every launcher of a scheduler.
    ///
    /// Thread launchers must all be unstarted; otherwise nothing is touched.
    /// If one launcher fails to start, the ones this call started are shut
    /// down and joined before the error is returned.
    ///
    /// # Errors
    ///
    /// - `KernelError::UnknownScheduler` if `identity` is not registered
    /// - `KernelError::Launcher` with `Violation::StartedTwice` if a thread
    ///   launcher was already started, or with the failing launcher's error
    pub fn start(&mut self, identity: SchedulerIdentity) -> Result<(), KernelError> {
        let entry = self.entry_mut(identity)?;
        if let Some(started) = entry
            .launchers
            .iter()
            .find(|l| l.mode() == ExecutionMode::Thread && l.state() != LaunchState::Unstarted)
        {
            return Err(LauncherError::Precondition {
                scheduler: started.loop_id(),
                violation: Violation::StartedTwice,
            }
            .into());
        }

        for idx in 0..entry.launchers.len() {
            if let Err(err) = entry.launchers[idx].start() {
                for launcher in &entry.launchers[..idx] {
                    launcher.get_loop().request_shutdown();
                }
                for launcher in &mut entry.launchers[..idx] {
                    if let Err(join_err) = launcher.join() {
                        warn!(error = %join_err, "Join failed while unwinding scheduler start");
                    }
                }
                return Err(err.into());
            }
        }
        debug!(scheduler = %identity, "Scheduler started");
        Ok(())
    }

    /// Queue a task on one of the scheduler's loops, round robin.
    ///
    /// A loop with a full queue is skipped in favor of the next one.
    ///
    /// # Errors
    ///
    /// - `KernelError::UnknownScheduler` if `identity` is not registered
    /// - `KernelError::Spawn` if every loop is full or shutting down
    pub fn spawn<F>(&self, identity: SchedulerIdentity, work: F) -> Result<TaskId, KernelError>
    where
        F: FnOnce() -> Result<(), TaskFailure> + Send + 'static,
    {
        let entry = self.entry(identity)?;
        let loops = entry.launchers.len();
        let start = entry.next_loop.fetch_add(1, Ordering::Relaxed);

        // The task moves into whichever loop accepts it, so probe for room first.
        for offset in 0..loops {
            let handle = entry.launchers[(start + offset) % loops].get_loop();
            if handle.is_shutdown_requested() {
                return Err(SpawnError::ShuttingDown {
                    scheduler: handle.loop_id(),
                }
                .into());
            }
            if handle.queued() < handle.capacity() {
                return Ok(handle.spawn(work)?);
            }
        }

        let full = entry.launchers[start % loops].get_loop().loop_id();
        Err(SpawnError::QueueFull { scheduler: full }.into())
    }

    /// Request shutdown of every loop in a scheduler. Idempotent.
    ///
    /// # Errors
    ///
    /// `KernelError::UnknownScheduler` if `identity` is not registered.
    pub fn shutdown(&self, identity: SchedulerIdentity) -> Result<(), KernelError> {
        for launcher in &self.entry(identity)?.launchers {
            launcher.get_loop().request_shutdown();
        }
        Ok(())
    }

    /// Drive every manual loop of a scheduler to completion on the calling thread.
    ///
    /// Loops are driven one after another, so each must see shutdown
    /// (requested beforehand or by one of its own tasks) for this to return.
    /// Thread-backed launchers are left alone.
    ///
    /// # Errors
    ///
    /// - `KernelError::UnknownScheduler` if `identity` is not registered
    /// - `KernelError::Launcher` with the first loop fault
    pub fn run_manual(&mut self, identity: SchedulerIdentity) -> Result<(), KernelError> {
        let entry = self.entry_mut(identity)?;
        for launcher in &mut entry.launchers {
            if let Some(manual) = launcher.as_manual_mut() {
                if !is_finished(manual.state()) {
                    manual.step_to_completion()?;
                }
            }
        }
        Ok(())
    }

    /// Join every launcher of a scheduler and unregister it.
    ///
    /// All launchers are joined even if one fails; the first error wins.
    ///
    /// # Errors
    ///
    /// - `KernelError::UnknownScheduler` if `identity` is not registered
    /// - `KernelError::ManualNotDriven` if a manual loop has neither reached
    ///   shutdown nor faulted yet; the scheduler stays registered
    /// - `KernelError::Launcher` with the first join failure
    pub fn join(&mut self, identity: SchedulerIdentity) -> Result<(), KernelError> {
        let entry = self.entry(identity)?;
        if let Some(pending) = entry
            .launchers
            .iter()
            .find(|l| l.mode() == ExecutionMode::Manual && !is_finished(l.state()))
        {
            return Err(KernelError::ManualNotDriven {
                scheduler: pending.loop_id(),
            });
        }

        let Some(mut entry) = self.schedulers.remove(&identity) else {
            return Err(KernelError::UnknownScheduler(identity));
        };
        let mut first_err = None;
        for launcher in &mut entry.launchers {
            if let Err(err) = launcher.join() {
                warn!(scheduler = %launcher.loop_id(), error = %err, "Launcher join failed");
                first_err.get_or_insert(err);
            }
        }
        info!(scheduler = %identity, "Scheduler joined");
        first_err.map_or(Ok(()), |err| Err(err.into()))
    }

    /// Statistics for each loop of a scheduler.
    ///
    /// # Errors
    ///
    /// `KernelError::UnknownScheduler` if `identity` is not registered.
    pub fn stats(&self, identity: SchedulerIdentity) -> Result<Vec<LoopStats>, KernelError> {
        Ok(self
            .entry(identity)?
            .launchers
            .iter()
            .map(|launcher| launcher.get_loop().stats())
            .collect())
    }

    /// Borrow one launcher.
    #[must_use]
    pub fn launcher(&self, identity: SchedulerIdentity, id: usize) -> Option<&Launcher> {
        self.schedulers.get(&identity)?.launchers.get(id)
    }

    /// Mutably borrow one launcher, e.g. to step a manual loop.
    pub fn launcher_mut(&mut self, identity: SchedulerIdentity, id: usize) -> Option<&mut Launcher> {
        self.schedulers.get_mut(&identity)?.launchers.get_mut(id)
    }

    fn entry(&self, identity: SchedulerIdentity) -> Result<&SchedulerEntry, KernelError> {
        self.schedulers
            .get(&identity)
            .ok_or(KernelError::UnknownScheduler(identity))
    }

    fn entry_mut(&mut self, identity: SchedulerIdentity) -> Result<&mut SchedulerEntry, KernelError> {
        self.schedulers
            .get_mut(&identity)
            .ok_or(KernelError::UnknownScheduler(identity))
    }
}

const fn is_finished(state: LaunchState) -> bool {
    matches!(state, LaunchState::Terminated | LaunchState::Faulted)
}

impl Drop for Kernel {
    fn drop(&mut self) {
        // Launchers detach their threads on drop; make sure those threads exit.
        for entry in self.schedulers.values() {
            for launcher in &entry.launchers {
                launcher.get_loop().request_shutdown();
            }
        }
    }
}
