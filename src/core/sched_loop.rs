//! The cooperative scheduler loop bound to one scheduler identity.
//!
//! A [`SchedulerLoop`] is exclusively owned by whoever drives it: `run_once`
//! takes `&mut self`, so two contexts can never pump the same loop. Everything
//! other threads may do to a running loop (queue work, request shutdown, read
//! statistics) goes through a cloneable [`LoopHandle`], which only touches
//! internally synchronized state.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::ThreadId;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::config::LoopConfig;
use crate::core::error::{LoopFault, SpawnError, TaskFailure};
use crate::util::{LoopId, TaskId};

/// A unit of work queued on a loop.
pub type Task = Box<dyn FnOnce() -> Result<(), TaskFailure> + Send + 'static>;

/// Outcome of one `run_once` turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopStatus {
    /// Tasks are still queued after this turn.
    MoreWorkPending,
    /// The run queue is empty.
    Idle,
    /// Shutdown was observed; the loop is finished.
    Shutdown,
}

/// Point-in-time statistics for one loop.
#[derive(Debug, Clone)]
pub struct LoopStats {
    /// Loop these numbers belong to.
    pub loop_id: LoopId,
    /// Tasks waiting in the run queue.
    pub queued: usize,
    /// Tasks that returned `Ok`.
    pub completed: u64,
    /// Tasks that returned a `TaskFailure`.
    pub failed: u64,
    /// Tasks discarded because shutdown arrived first.
    pub dropped: u64,
    /// `run_once` calls so far.
    pub turns: u64,
    /// Whether shutdown has been requested.
    pub shutdown_requested: bool,
    /// Thread currently driving the loop, if any.
    pub driver_thread: Option<ThreadId>,
}

struct QueuedTask {
    id: TaskId,
    work: Task,
}

#[derive(Default)]
struct LoopCounters {
    completed: AtomicU64,
    failed: AtomicU64,
    dropped: AtomicU64,
    turns: AtomicU64,
}

/// State reachable from any thread.
struct Shared {
    loop_id: LoopId,
    task_tx: Sender<QueuedTask>,
    /// Read-locked across a spawn's check and send, write-locked to request
    /// shutdown, so no task lands in the queue after the flag is set.
    shutdown: RwLock<bool>,
    /// Set when work or shutdown arrives; cleared by the parked driver.
    signalled: Mutex<bool>,
    wake: Condvar,
    driver_thread: Mutex<Option<ThreadId>>,
    next_task_id: AtomicU64,
    counters: LoopCounters,
}

impl Shared {
    fn notify(&self) {
        let mut signalled = self.signalled.lock();
        *signalled = true;
        self.wake.notify_all();
    }
}

/// Thread-safe control and diagnostics handle for a loop.
///
/// A handle can never drive the loop; it only queues work, requests shutdown,
/// and reads counters.
#[derive(Clone)]
pub struct LoopHandle {
    shared: Arc<Shared>,
}

impl std::fmt::Debug for LoopHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoopHandle")
            .field("loop_id", &self.shared.loop_id)
            .field("shutdown", &self.is_shutdown_requested())
            .finish_non_exhaustive()
    }
}

impl LoopHandle {
    /// Loop this handle refers to.
    #[must_use]
    pub fn loop_id(&self) -> LoopId {
        self.shared.loop_id
    }

    /// Queue a task on the loop.
    ///
    /// # Errors
    ///
    /// - `SpawnError::ShuttingDown` once shutdown has been requested
    /// - `SpawnError::QueueFull` if `max_queue_depth` tasks are already queued
    pub fn spawn<F>(&self, work: F) -> Result<TaskId, SpawnError>
    where
        F: FnOnce() -> Result<(), TaskFailure> + Send + 'static,
    {
        let scheduler = self.shared.loop_id;
        let shutdown = self.shared.shutdown.read();
        if *shutdown {
            return Err(SpawnError::ShuttingDown { scheduler });
        }

        let id = self.shared.next_task_id.fetch_add(1, Ordering::Relaxed);
        let task = QueuedTask {
            id,
            work: Box::new(work),
        };
        let sent = self.shared.task_tx.try_send(task);
        drop(shutdown);
        match sent {
            Ok(()) => {
                self.shared.notify();
                debug!(scheduler = %scheduler, task_id = id, "Task queued");
                Ok(id)
            }
            Err(TrySendError::Full(_)) => {
                warn!(scheduler = %scheduler, "Run queue is full");
                Err(SpawnError::QueueFull { scheduler })
            }
            Err(TrySendError::Disconnected(_)) => Err(SpawnError::ShuttingDown { scheduler }),
        }
    }

    /// Ask the loop to stop at its next turn boundary. Idempotent.
    pub fn request_shutdown(&self) {
        let first = !std::mem::replace(&mut *self.shared.shutdown.write(), true);
        if first {
            info!(scheduler = %self.shared.loop_id, "Shutdown requested");
        }
        self.shared.notify();
    }

    /// Whether shutdown has been requested.
    #[must_use]
    pub fn is_shutdown_requested(&self) -> bool {
        *self.shared.shutdown.read()
    }

    /// Number of tasks waiting in the run queue.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.shared.task_tx.len()
    }

    /// Maximum number of tasks the run queue holds.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.task_tx.capacity().unwrap_or(usize::MAX)
    }

    /// Thread currently driving the loop, if any.
    #[must_use]
    pub fn driver_thread(&self) -> Option<ThreadId> {
        *self.shared.driver_thread.lock()
    }

    /// Snapshot current statistics.
    #[must_use]
    pub fn stats(&self) -> LoopStats {
        let counters = &self.shared.counters;
        LoopStats {
            loop_id: self.shared.loop_id,
            queued: self.queued(),
            completed: counters.completed.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
            dropped: counters.dropped.load(Ordering::Relaxed),
            turns: counters.turns.load(Ordering::Relaxed),
            shutdown_requested: self.is_shutdown_requested(),
            driver_thread: self.driver_thread(),
        }
    }

    pub(crate) fn set_driver_thread(&self, thread: Option<ThreadId>) {
        *self.shared.driver_thread.lock() = thread;
    }
}

/// Run state for one scheduler. Driven by exactly one context at a time.
pub struct SchedulerLoop {
    handle: LoopHandle,
    task_rx: Receiver<QueuedTask>,
    config: LoopConfig,
    poisoned: bool,
}

impl SchedulerLoop {
    /// Create an empty loop.
    ///
    /// # Panics
    ///
    /// The run queue is preallocated; an unvalidated `max_queue_depth` far
    /// above [`MAX_QUEUE_DEPTH`](crate::config::MAX_QUEUE_DEPTH) can fail to
    /// allocate. Factories validate their config before calling this.
    #[must_use]
    pub fn new(loop_id: LoopId, config: LoopConfig) -> Self {
        let (task_tx, task_rx) = bounded(config.max_queue_depth);
        let shared = Arc::new(Shared {
            loop_id,
            task_tx,
            shutdown: RwLock::new(false),
            signalled: Mutex::new(false),
            wake: Condvar::new(),
            driver_thread: Mutex::new(None),
            next_task_id: AtomicU64::new(0),
            counters: LoopCounters::default(),
        });
        debug!(scheduler = %loop_id, "Scheduler loop created");
        Self {
            handle: LoopHandle { shared },
            task_rx,
            config,
            poisoned: false,
        }
    }

    /// Loop identity.
    #[must_use]
    pub fn loop_id(&self) -> LoopId {
        self.handle.loop_id()
    }

    /// A new handle onto this loop's shared state.
    #[must_use]
    pub fn handle(&self) -> LoopHandle {
        self.handle.clone()
    }

    /// Loop tuning in effect.
    #[must_use]
    pub const fn config(&self) -> &LoopConfig {
        &self.config
    }

    /// Whether a task panic has poisoned the loop.
    #[must_use]
    pub const fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    /// Ask the loop to stop at its next turn boundary. Idempotent.
    pub fn request_shutdown(&self) {
        self.handle.request_shutdown();
    }

    /// Run at most `turn_budget` queued tasks without blocking.
    ///
    /// Shutdown is checked first: once requested, queued tasks are discarded
    /// and every call returns [`LoopStatus::Shutdown`].
    ///
    /// # Errors
    ///
    /// - `LoopFault::TaskPanicked` if a task panics; the loop is poisoned
    /// - `LoopFault::Poisoned` on any call after that
    pub fn run_once(&mut self) -> Result<LoopStatus, LoopFault> {
        if self.poisoned {
            return Err(LoopFault::Poisoned);
        }
        self.handle.shared.counters.turns.fetch_add(1, Ordering::Relaxed);

        if self.handle.is_shutdown_requested() {
            let dropped = self.discard_queued();
            if dropped > 0 {
                warn!(scheduler = %self.loop_id(), dropped, "Discarded queued tasks at shutdown");
            }
            return Ok(LoopStatus::Shutdown);
        }

        for _ in 0..self.config.turn_budget {
            let Ok(task) = self.task_rx.try_recv() else {
                break;
            };
            self.run_task(task)?;
        }

        if self.task_rx.is_empty() {
            Ok(LoopStatus::Idle)
        } else {
            Ok(LoopStatus::MoreWorkPending)
        }
    }

    /// Park the calling thread until work or shutdown arrives, or `timeout` passes.
    ///
    /// Returns `true` if a signal was consumed.
    pub fn wait_for_work(&self, timeout: Duration) -> bool {
        let shared = &self.handle.shared;
        let mut signalled = shared.signalled.lock();
        if !*signalled && self.task_rx.is_empty() && !*shared.shutdown.read() {
            let _ = shared.wake.wait_for(&mut signalled, timeout);
        }
        std::mem::replace(&mut *signalled, false)
    }

    fn run_task(&mut self, task: QueuedTask) -> Result<(), LoopFault> {
        let QueuedTask { id, work } = task;
        let counters = &self.handle.shared.counters;
        match panic::catch_unwind(AssertUnwindSafe(work)) {
            Ok(Ok(())) => {
                counters.completed.fetch_add(1, Ordering::Relaxed);
                debug!(scheduler = %self.loop_id(), task_id = id, "Task completed");
                Ok(())
            }
            Ok(Err(failure)) => {
                counters.failed.fetch_add(1, Ordering::Relaxed);
                warn!(scheduler = %self.loop_id(), task_id = id, error = %failure, "Task failed");
                Ok(())
            }
            Err(payload) => {
                self.poisoned = true;
                let message = panic_message(payload.as_ref());
                error!(scheduler = %self.loop_id(), task_id = id, %message, "Task panicked, loop poisoned");
                Err(LoopFault::TaskPanicked { task: id, message })
            }
        }
    }

    fn discard_queued(&self) -> u64 {
        let mut dropped = 0;
        while self.task_rx.try_recv().is_ok() {
            dropped += 1;
        }
        self.handle
            .shared
            .counters
            .dropped
            .fetch_add(dropped, Ordering::Relaxed);
        dropped
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::SchedulerIdentity;
    use std::sync::atomic::AtomicUsize;
    use std::thread;
    use std::time::Instant;

    fn make_loop(turn_budget: usize, max_queue_depth: usize) -> SchedulerLoop {
        let config = LoopConfig {
            max_queue_depth,
            turn_budget,
            idle_wait_ms: 10,
        };
        SchedulerLoop::new(LoopId::new(SchedulerIdentity::new(0), 0), config)
    }

    #[test]
    fn test_empty_loop_is_idle() {
        let mut sched_loop = make_loop(4, 8);
        assert_eq!(sched_loop.run_once(), Ok(LoopStatus::Idle));
        assert_eq!(sched_loop.handle().stats().turns, 1);
    }

    #[test]
    fn test_turn_budget_limits_work_per_turn() {
        let mut sched_loop = make_loop(2, 16);
        let handle = sched_loop.handle();
        let ran = Arc::new(AtomicUsize::new(0));
        for _ in 0..5 {
            let ran = Arc::clone(&ran);
            handle
                .spawn(move || {
                    ran.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .unwrap();
        }

        assert_eq!(sched_loop.run_once(), Ok(LoopStatus::MoreWorkPending));
        assert_eq!(ran.load(Ordering::SeqCst), 2);
        assert_eq!(sched_loop.run_once(), Ok(LoopStatus::MoreWorkPending));
        assert_eq!(sched_loop.run_once(), Ok(LoopStatus::Idle));
        assert_eq!(ran.load(Ordering::SeqCst), 5);
        assert_eq!(handle.stats().completed, 5);
    }

    #[test]
    fn test_task_failure_is_recoverable() {
        let mut sched_loop = make_loop(4, 8);
        let handle = sched_loop.handle();
        handle.spawn(|| Err("bad input".into())).unwrap();
        handle.spawn(|| Ok(())).unwrap();

        assert_eq!(sched_loop.run_once(), Ok(LoopStatus::Idle));
        let stats = handle.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.completed, 1);
        assert!(!sched_loop.is_poisoned());
    }

    #[test]
    fn test_task_panic_poisons_loop() {
        let mut sched_loop = make_loop(4, 8);
        let handle = sched_loop.handle();
        let id = handle.spawn(|| panic!("boom")).unwrap();

        match sched_loop.run_once() {
            Err(LoopFault::TaskPanicked { task, message }) => {
                assert_eq!(task, id);
                assert_eq!(message, "boom");
            }
            other => panic!("expected TaskPanicked, got {other:?}"),
        }
        assert!(sched_loop.is_poisoned());
        assert_eq!(sched_loop.run_once(), Err(LoopFault::Poisoned));
    }

    #[test]
    fn test_shutdown_discards_queued_tasks() {
        let mut sched_loop = make_loop(1, 8);
        let handle = sched_loop.handle();
        for _ in 0..3 {
            handle.spawn(|| Ok(())).unwrap();
        }
        handle.request_shutdown();

        assert_eq!(sched_loop.run_once(), Ok(LoopStatus::Shutdown));
        assert_eq!(sched_loop.run_once(), Ok(LoopStatus::Shutdown));
        let stats = handle.stats();
        assert_eq!(stats.dropped, 3);
        assert_eq!(stats.completed, 0);
        assert_eq!(stats.queued, 0);
    }

    #[test]
    fn test_spawn_after_shutdown_rejected() {
        let sched_loop = make_loop(1, 8);
        let handle = sched_loop.handle();
        sched_loop.request_shutdown();
        assert_eq!(
            handle.spawn(|| Ok(())),
            Err(SpawnError::ShuttingDown {
                scheduler: sched_loop.loop_id()
            })
        );
    }

    #[test]
    fn test_spawn_rejects_when_queue_full() {
        let sched_loop = make_loop(1, 2);
        let handle = sched_loop.handle();
        handle.spawn(|| Ok(())).unwrap();
        handle.spawn(|| Ok(())).unwrap();
        assert!(matches!(
            handle.spawn(|| Ok(())),
            Err(SpawnError::QueueFull { .. })
        ));
        assert_eq!(handle.queued(), 2);
    }

    #[test]
    fn test_capacity_matches_queue_depth() {
        let sched_loop = make_loop(1, 3);
        assert_eq!(sched_loop.handle().capacity(), 3);
    }

    #[test]
    fn test_request_shutdown_idempotent() {
        let mut once = make_loop(1, 4);
        let mut many = make_loop(1, 4);
        once.request_shutdown();
        for _ in 0..5 {
            many.request_shutdown();
        }
        assert_eq!(once.run_once(), many.run_once());
        assert_eq!(
            once.handle().stats().shutdown_requested,
            many.handle().stats().shutdown_requested
        );
    }

    #[test]
    fn test_wait_for_work_wakes_on_spawn() {
        let sched_loop = make_loop(1, 4);
        let handle = sched_loop.handle();
        let spawner = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.spawn(|| Ok(())).unwrap();
        });

        let start = Instant::now();
        let mut woke = false;
        while !woke && start.elapsed() < Duration::from_secs(5) {
            woke = sched_loop.wait_for_work(Duration::from_secs(5));
        }
        assert!(woke);
        assert!(start.elapsed() < Duration::from_secs(5));
        spawner.join().unwrap();
    }

    #[test]
    fn test_wait_for_work_returns_immediately_when_queued() {
        let sched_loop = make_loop(1, 4);
        sched_loop.handle().spawn(|| Ok(())).unwrap();
        let start = Instant::now();
        sched_loop.wait_for_work(Duration::from_secs(5));
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
