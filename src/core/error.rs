//! Error types for loops, launchers, and the kernel.

use std::fmt;

use thiserror::Error;

use crate::util::{LoopId, SchedulerIdentity, TaskId};

/// Unrecoverable failure surfacing from inside a scheduler loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoopFault {
    /// A task panicked while the loop was running it.
    #[error("task {task} panicked: {message}")]
    TaskPanicked {
        /// Task that panicked.
        task: TaskId,
        /// Panic payload, when it was a string.
        message: String,
    },
    /// The loop already faulted and may not be driven again.
    #[error("scheduler loop is poisoned by an earlier fault")]
    Poisoned,
    /// The launcher thread panicked outside of any task.
    #[error("launcher thread panicked: {0}")]
    ThreadPanicked(String),
}

/// Lifecycle rule broken by a launcher caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Violation {
    /// `join()` on a thread launcher that was never started.
    JoinBeforeStart,
    /// `start()` on a launcher that already left the unstarted state.
    StartedTwice,
    /// `join()` on a thread launcher that was already joined.
    JoinedTwice,
    /// Driving a manual launcher that already terminated.
    DriveAfterTermination,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::JoinBeforeStart => write!(f, "join called before start"),
            Self::StartedTwice => write!(f, "start called on a launcher that is not unstarted"),
            Self::JoinedTwice => write!(f, "join called on a launcher that was already joined"),
            Self::DriveAfterTermination => write!(f, "manual loop driven after it terminated"),
        }
    }
}

/// Errors produced by launchers and launcher factories.
#[derive(Debug, Error)]
pub enum LauncherError {
    /// The OS resource needed to run the scheduler could not be acquired.
    #[error("{scheduler}: registration failed: {source}")]
    Registration {
        /// Scheduler loop involved.
        scheduler: LoopId,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
    /// A lifecycle precondition was violated by the caller.
    #[error("{scheduler}: precondition violated: {violation}")]
    Precondition {
        /// Scheduler loop involved.
        scheduler: LoopId,
        /// Rule that was broken.
        violation: Violation,
    },
    /// The scheduler loop terminated with a fault.
    #[error("{scheduler}: loop fault: {fault}")]
    LoopFault {
        /// Scheduler loop involved.
        scheduler: LoopId,
        /// Fault reported by the loop.
        #[source]
        fault: LoopFault,
    },
    /// Launcher configuration failed validation.
    #[error("invalid launcher configuration: {0}")]
    InvalidConfig(String),
}

impl LauncherError {
    /// Scheduler loop this error refers to, if any.
    #[must_use]
    pub const fn scheduler(&self) -> Option<LoopId> {
        match self {
            Self::Registration { scheduler, .. }
            | Self::Precondition { scheduler, .. }
            | Self::LoopFault { scheduler, .. } => Some(*scheduler),
            Self::InvalidConfig(_) => None,
        }
    }
}

/// Errors returned when queueing work onto a loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpawnError {
    /// The loop's run queue is at `max_queue_depth`.
    #[error("{scheduler}: run queue full")]
    QueueFull {
        /// Scheduler loop involved.
        scheduler: LoopId,
    },
    /// Shutdown was requested; the loop accepts no new work.
    #[error("{scheduler}: shutting down")]
    ShuttingDown {
        /// Scheduler loop involved.
        scheduler: LoopId,
    },
}

/// Recoverable failure reported by a task. The loop keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct TaskFailure(pub String);

impl From<&str> for TaskFailure {
    fn from(msg: &str) -> Self {
        Self(msg.to_owned())
    }
}

impl From<String> for TaskFailure {
    fn from(msg: String) -> Self {
        Self(msg)
    }
}

/// Errors produced by the runtime kernel.
#[derive(Debug, Error)]
pub enum KernelError {
    /// No scheduler with this identity is registered.
    #[error("unknown scheduler {0}")]
    UnknownScheduler(SchedulerIdentity),
    /// A manual loop was joined before the host drove it to shutdown.
    #[error("{scheduler}: manual loop joined before the host drove it to shutdown")]
    ManualNotDriven {
        /// Scheduler loop involved.
        scheduler: LoopId,
    },
    /// A launcher operation failed.
    #[error(transparent)]
    Launcher(#[from] LauncherError),
    /// Queueing work failed.
    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
