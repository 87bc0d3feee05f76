//! # Prometheus Sched Launcher
//!
//! Launch-and-drive layer for the scheduler loops of an M:N green-thread runtime.
//!
//! Every logical scheduler runs one or more cooperative scheduler loops. This
//! crate creates those loops and decides *how* each one gets pumped:
//!
//! - **Thread-backed**: a dedicated OS thread drives the loop until it observes
//!   shutdown; `start`/`join` map onto thread spawn/join.
//! - **Manual**: no thread is spawned; the embedding host (a test harness, or
//!   the runtime's own bootstrap thread) drives the loop explicitly by stepping
//!   it or running it to completion.
//!
//! ## Key Pieces
//!
//! - **`SchedulerLoop`**: bounded FIFO run queue with a per-turn task budget;
//!   exclusively owned by whoever drives it
//! - **`LoopHandle`**: thread-safe handle to queue work, request shutdown,
//!   and read statistics
//! - **`Driver`**: blocking `start_main_loop` or a single `step`
//! - **`Launcher`**: `Thread` or `Manual` strategy around one loop
//! - **`LauncherFactory`**: one active factory per runtime, chosen by config
//! - **`Kernel`**: registers schedulers and starts, joins, and drives them
//!
//! ## Thread-backed scheduler
//!
//! ```rust
//! use prometheus_sched_launcher::config::{ExecutionMode, RuntimeConfig};
//! use prometheus_sched_launcher::runtime::Kernel;
//!
//! let mut kernel = Kernel::new(RuntimeConfig::with_mode(ExecutionMode::Thread)).unwrap();
//! let sched = kernel.create_scheduler(2).unwrap();
//! kernel.start(sched).unwrap();
//!
//! kernel.spawn(sched, || Ok(())).unwrap();
//!
//! kernel.shutdown(sched).unwrap();
//! kernel.join(sched).unwrap();
//! ```
//!
//! ## Manual scheduler driven by the host
//!
//! ```rust
//! use prometheus_sched_launcher::config::{ExecutionMode, RuntimeConfig};
//! use prometheus_sched_launcher::runtime::Kernel;
//!
//! let mut kernel = Kernel::new(RuntimeConfig::with_mode(ExecutionMode::Manual)).unwrap();
//! let sched = kernel.create_scheduler(1).unwrap();
//! kernel.start(sched).unwrap(); // no-op
//!
//! let handle = kernel.launcher(sched, 0).unwrap().get_loop().clone();
//! kernel.spawn(sched, move || {
//!     handle.request_shutdown();
//!     Ok(())
//! }).unwrap();
//!
//! kernel.run_manual(sched).unwrap(); // drives on this thread
//! kernel.join(sched).unwrap();
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Scheduler loops, drivers, launchers, and factories.
pub mod core;
/// Configuration models for launchers, loops, and the runtime.
pub mod config;
/// Builders to construct launcher components from configuration.
pub mod builders;
/// Runtime kernel and host adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
