//! Tests for builder modules

use prometheus_sched_launcher::builders::{build_factory, build_launchers};
use prometheus_sched_launcher::config::{ExecutionMode, LauncherConfig, RuntimeConfig};
use prometheus_sched_launcher::core::{LaunchState, LauncherError};
use prometheus_sched_launcher::util::{LoopId, SchedulerIdentity};

#[test]
fn test_build_factory_thread_mode() {
    let factory = build_factory(&RuntimeConfig::with_mode(ExecutionMode::Thread)).unwrap();
    assert_eq!(factory.mode(), ExecutionMode::Thread);
}

#[test]
fn test_build_factory_manual_mode() {
    let factory = build_factory(&RuntimeConfig::with_mode(ExecutionMode::Manual)).unwrap();
    assert_eq!(factory.mode(), ExecutionMode::Manual);
}

#[test]
fn test_build_factory_invalid_config() {
    let cfg = RuntimeConfig::default().with_launcher(LauncherConfig::new().with_turn_budget(0));
    let err = build_factory(&cfg).err().unwrap();
    assert!(matches!(err, LauncherError::InvalidConfig(_)));
}

#[test]
fn test_build_launchers_ids_in_order() {
    let factory = build_factory(&RuntimeConfig::with_mode(ExecutionMode::Manual)).unwrap();
    let identity = SchedulerIdentity::new(4);
    let launchers = build_launchers(factory.as_ref(), identity, 3).unwrap();

    assert_eq!(launchers.len(), 3);
    for (idx, launcher) in launchers.iter().enumerate() {
        assert_eq!(launcher.loop_id(), LoopId::new(identity, idx));
        assert_eq!(launcher.state(), LaunchState::Unstarted);
    }
}
