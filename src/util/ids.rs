//! Identifier types shared by loops, launchers, and the kernel.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Task identifier, unique within one scheduler loop.
pub type TaskId = u64;

/// Opaque handle naming a scheduler within the runtime kernel.
///
/// Launchers hold it as a back reference only; it owns nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchedulerIdentity(u32);

impl SchedulerIdentity {
    /// Wrap a raw scheduler number.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw scheduler number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for SchedulerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sched-{}", self.0)
    }
}

/// Identifies one scheduler loop: the owning scheduler plus the loop's index in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoopId {
    /// Scheduler the loop belongs to.
    pub scheduler: SchedulerIdentity,
    /// Index of the loop within its scheduler.
    pub index: usize,
}

impl LoopId {
    /// Build a loop id.
    #[must_use]
    pub const fn new(scheduler: SchedulerIdentity, index: usize) -> Self {
        Self { scheduler, index }
    }
}

impl fmt::Display for LoopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.scheduler, self.index)
    }
}
