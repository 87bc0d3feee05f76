//! Tests for configuration validation

use prometheus_sched_launcher::config::{
    ExecutionMode, LauncherConfig, LoopConfig, RuntimeConfig, MAX_QUEUE_DEPTH,
};
use prometheus_sched_launcher::core::{LauncherError, ManualLauncherFactory};

#[test]
fn test_loop_config_defaults_are_valid() {
    let cfg = LoopConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.idle_wait().as_millis(), 50);
}

#[test]
fn test_loop_config_invalid_queue_depth() {
    let invalid = LoopConfig {
        max_queue_depth: 0,
        turn_budget: 8,
        idle_wait_ms: 10,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_loop_config_queue_depth_upper_bound() {
    let at_limit = LoopConfig {
        max_queue_depth: MAX_QUEUE_DEPTH,
        turn_budget: 8,
        idle_wait_ms: 10,
    };
    assert!(at_limit.validate().is_ok());

    let oversized = LoopConfig {
        max_queue_depth: usize::MAX / 2,
        ..at_limit
    };
    assert!(oversized.validate().is_err());
}

#[test]
fn test_oversized_queue_depth_rejected_before_allocation() {
    let err = ManualLauncherFactory::new(LauncherConfig::new().with_max_queue_depth(usize::MAX / 2))
        .unwrap_err();
    assert!(matches!(err, LauncherError::InvalidConfig(_)));

    let json = format!(
        r#"{{ "launcher": {{ "loop": {{ "max_queue_depth": {}, "turn_budget": 4, "idle_wait_ms": 5 }} }} }}"#,
        MAX_QUEUE_DEPTH + 1
    );
    let err = RuntimeConfig::from_json_str(&json).unwrap_err();
    assert!(err.contains("max_queue_depth"));
}

#[test]
fn test_loop_config_invalid_turn_budget() {
    let invalid = LoopConfig {
        max_queue_depth: 8,
        turn_budget: 0,
        idle_wait_ms: 10,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_launcher_config_rejects_empty_prefix() {
    let cfg = LauncherConfig::new().with_thread_name_prefix("");
    assert!(cfg.validate().is_err());
}

#[test]
fn test_launcher_config_rejects_zero_stack() {
    let cfg = LauncherConfig::new().with_thread_stack_size(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_runtime_config_rejects_zero_threads() {
    let cfg = RuntimeConfig::default().with_default_threads(0);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_runtime_config_default_mode_is_thread() {
    let cfg = RuntimeConfig::default();
    assert_eq!(cfg.launcher.mode, ExecutionMode::Thread);
    assert!(cfg.default_threads >= 1);
}

#[test]
fn test_runtime_config_from_json() {
    let json = r#"{
        "default_threads": 2,
        "launcher": {
            "mode": "manual",
            "thread_name_prefix": "rt",
            "loop": { "max_queue_depth": 64, "turn_budget": 4, "idle_wait_ms": 5 }
        }
    }"#;
    let cfg = RuntimeConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.default_threads, 2);
    assert_eq!(cfg.launcher.mode, ExecutionMode::Manual);
    assert_eq!(cfg.launcher.thread_name_prefix, "rt");
    assert_eq!(cfg.launcher.thread_stack_size, None);
    assert_eq!(cfg.launcher.sched_loop.max_queue_depth, 64);
    assert_eq!(cfg.launcher.sched_loop.turn_budget, 4);
}

#[test]
fn test_runtime_config_from_json_partial_uses_defaults() {
    let cfg = RuntimeConfig::from_json_str(r#"{ "launcher": { "mode": "thread" } }"#).unwrap();
    assert_eq!(cfg.launcher.thread_name_prefix, "sched");
    assert_eq!(cfg.launcher.sched_loop.turn_budget, 32);
}

#[test]
fn test_runtime_config_from_json_invalid() {
    let err = RuntimeConfig::from_json_str(r#"{ "default_threads": 0 }"#).unwrap_err();
    assert!(err.contains("default_threads"));

    let err = RuntimeConfig::from_json_str(r#"{ "launcher": { "mode": "fiber" } }"#).unwrap_err();
    assert!(err.starts_with("parse error"));
}
