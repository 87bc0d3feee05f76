//! Tests for error types

use prometheus_sched_launcher::core::{
    KernelError, LauncherError, LoopFault, SpawnError, TaskFailure, Violation,
};
use prometheus_sched_launcher::util::{LoopId, SchedulerIdentity};

fn loop_id() -> LoopId {
    LoopId::new(SchedulerIdentity::new(2), 1)
}

#[test]
fn test_precondition_error() {
    let err = LauncherError::Precondition {
        scheduler: loop_id(),
        violation: Violation::JoinBeforeStart,
    };
    assert_eq!(
        format!("{}", err),
        "sched-2/1: precondition violated: join called before start"
    );
    assert_eq!(err.scheduler(), Some(loop_id()));
}

#[test]
fn test_registration_error() {
    let err = LauncherError::Registration {
        scheduler: loop_id(),
        source: std::io::Error::new(std::io::ErrorKind::OutOfMemory, "no stack"),
    };
    assert_eq!(format!("{}", err), "sched-2/1: registration failed: no stack");
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_loop_fault_error() {
    let err = LauncherError::LoopFault {
        scheduler: loop_id(),
        fault: LoopFault::TaskPanicked {
            task: 7,
            message: "boom".to_string(),
        },
    };
    assert_eq!(format!("{}", err), "sched-2/1: loop fault: task 7 panicked: boom");
}

#[test]
fn test_invalid_config_has_no_scheduler() {
    let err = LauncherError::InvalidConfig("turn_budget must be greater than 0".to_string());
    assert_eq!(err.scheduler(), None);
    assert_eq!(
        format!("{}", err),
        "invalid launcher configuration: turn_budget must be greater than 0"
    );
}

#[test]
fn test_spawn_errors() {
    let full = SpawnError::QueueFull { scheduler: loop_id() };
    let closing = SpawnError::ShuttingDown { scheduler: loop_id() };
    assert_eq!(format!("{}", full), "sched-2/1: run queue full");
    assert_eq!(format!("{}", closing), "sched-2/1: shutting down");
}

#[test]
fn test_task_failure_conversions() {
    assert_eq!(TaskFailure::from("bad input"), TaskFailure("bad input".to_string()));
    assert_eq!(format!("{}", TaskFailure::from(String::from("oops"))), "oops");
}

#[test]
fn test_kernel_error_is_transparent() {
    let err: KernelError = SpawnError::ShuttingDown { scheduler: loop_id() }.into();
    assert_eq!(format!("{}", err), "sched-2/1: shutting down");

    let err = KernelError::UnknownScheduler(SchedulerIdentity::new(9));
    assert_eq!(format!("{}", err), "unknown scheduler sched-9");
}
