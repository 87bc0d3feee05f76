//! Core launch-and-drive abstractions: loops, drivers, launchers, factories.

pub mod driver;
pub mod error;
pub mod factory;
pub mod launcher;
pub mod sched_loop;

pub use driver::Driver;
pub use error::{
    AppResult, KernelError, LauncherError, LoopFault, SpawnError, TaskFailure, Violation,
};
pub use factory::{LauncherFactory, ManualLauncherFactory, ThreadLauncherFactory};
pub use launcher::{LaunchState, Launcher, ManualLauncher, ThreadLauncher};
pub use sched_loop::{LoopHandle, LoopStats, LoopStatus, SchedulerLoop, Task};
