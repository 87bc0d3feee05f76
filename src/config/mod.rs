//! Configuration models for launchers, loops, and the runtime.

pub mod launcher;

pub use launcher::{ExecutionMode, LauncherConfig, LoopConfig, RuntimeConfig, MAX_QUEUE_DEPTH};
