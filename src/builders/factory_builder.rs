//! Builders to construct launcher factories and launchers from configuration.

use tracing::info;

use crate::config::{ExecutionMode, RuntimeConfig};
use crate::core::{
    LauncherError, Launcher, LauncherFactory, ManualLauncherFactory, ThreadLauncherFactory,
};
use crate::util::SchedulerIdentity;

/// Build the single launcher factory a runtime uses, chosen by `cfg.launcher.mode`.
///
/// # Errors
///
/// `LauncherError::InvalidConfig` if the configuration fails validation.
pub fn build_factory(cfg: &RuntimeConfig) -> Result<Box<dyn LauncherFactory>, LauncherError> {
    cfg.validate().map_err(LauncherError::InvalidConfig)?;

    let factory: Box<dyn LauncherFactory> = match cfg.launcher.mode {
        ExecutionMode::Thread => Box::new(ThreadLauncherFactory::new(cfg.launcher.clone())?),
        ExecutionMode::Manual => Box::new(ManualLauncherFactory::new(cfg.launcher.clone())?),
    };
    info!(mode = ?factory.mode(), "Launcher factory built");
    Ok(factory)
}

/// Create `count` launchers for one scheduler, ids `0..count`.
///
/// # Errors
///
/// Stops at the first launcher the factory fails to create.
pub fn build_launchers(
    factory: &dyn LauncherFactory,
    identity: SchedulerIdentity,
    count: usize,
) -> Result<Vec<Launcher>, LauncherError> {
    (0..count).map(|id| factory.create(identity, id)).collect()
}
