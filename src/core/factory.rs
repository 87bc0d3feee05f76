//! Launcher factories: the single creation point for launchers.
//!
//! The kernel only ever talks to `dyn LauncherFactory`; which concrete
//! factory is active is decided once, from configuration, by
//! [`build_factory`](crate::builders::build_factory).

use tracing::debug;

use crate::config::{ExecutionMode, LauncherConfig};
use crate::core::error::LauncherError;
use crate::core::launcher::{Launcher, ManualLauncher, ThreadLauncher};
use crate::core::sched_loop::SchedulerLoop;
use crate::util::{LoopId, SchedulerIdentity};

/// Produces launchers, one per scheduler registration request.
pub trait LauncherFactory: Send + Sync {
    /// Create a launcher for loop `id` of scheduler `identity`.
    ///
    /// # Errors
    ///
    /// `LauncherError::Registration` when the resources for the launcher
    /// cannot be acquired. Not retried here.
    fn create(&self, identity: SchedulerIdentity, id: usize) -> Result<Launcher, LauncherError>;

    /// Execution strategy of every launcher this factory produces.
    fn mode(&self) -> ExecutionMode;
}

fn validated(config: LauncherConfig) -> Result<LauncherConfig, LauncherError> {
    config.validate().map_err(LauncherError::InvalidConfig)?;
    Ok(config)
}

/// Factory for thread-backed launchers.
#[derive(Debug, Clone)]
pub struct ThreadLauncherFactory {
    config: LauncherConfig,
}

impl ThreadLauncherFactory {
    /// Create a factory; the config's `mode` field is ignored.
    ///
    /// # Errors
    ///
    /// `LauncherError::InvalidConfig` if the configuration fails validation.
    pub fn new(config: LauncherConfig) -> Result<Self, LauncherError> {
        Ok(Self {
            config: validated(config)?,
        })
    }
}

impl LauncherFactory for ThreadLauncherFactory {
    fn create(&self, identity: SchedulerIdentity, id: usize) -> Result<Launcher, LauncherError> {
        let loop_id = LoopId::new(identity, id);
        let sched_loop = SchedulerLoop::new(loop_id, self.config.sched_loop.clone());
        debug!(scheduler = %loop_id, "Thread launcher created");
        Ok(Launcher::Thread(ThreadLauncher::new(sched_loop, &self.config)))
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Thread
    }
}

/// Factory for host-driven launchers.
#[derive(Debug, Clone)]
pub struct ManualLauncherFactory {
    config: LauncherConfig,
}

impl ManualLauncherFactory {
    /// Create a factory; only the loop settings of `config` are used.
    ///
    /// # Errors
    ///
    /// `LauncherError::InvalidConfig` if the configuration fails validation.
    pub fn new(config: LauncherConfig) -> Result<Self, LauncherError> {
        Ok(Self {
            config: validated(config)?,
        })
    }
}

impl LauncherFactory for ManualLauncherFactory {
    fn create(&self, identity: SchedulerIdentity, id: usize) -> Result<Launcher, LauncherError> {
        let loop_id = LoopId::new(identity, id);
        let sched_loop = SchedulerLoop::new(loop_id, self.config.sched_loop.clone());
        debug!(scheduler = %loop_id, "Manual launcher created");
        Ok(Launcher::Manual(ManualLauncher::new(sched_loop)))
    }

    fn mode(&self) -> ExecutionMode {
        ExecutionMode::Manual
    }
}
