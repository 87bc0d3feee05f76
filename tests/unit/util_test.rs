//! Tests for utility types

use prometheus_sched_launcher::util::{LoopId, SchedulerIdentity};
use std::collections::BTreeSet;

#[test]
fn test_scheduler_identity_ordering() {
    let ids: BTreeSet<_> = [3, 1, 2].into_iter().map(SchedulerIdentity::new).collect();
    let raw: Vec<u32> = ids.into_iter().map(SchedulerIdentity::get).collect();
    assert_eq!(raw, vec![1, 2, 3]);
}

#[test]
fn test_scheduler_identity_serde_is_transparent() {
    let json = serde_json::to_string(&SchedulerIdentity::new(4)).unwrap();
    assert_eq!(json, "4");
    let back: SchedulerIdentity = serde_json::from_str(&json).unwrap();
    assert_eq!(back, SchedulerIdentity::new(4));
}

#[test]
fn test_loop_id_fields() {
    let id = LoopId::new(SchedulerIdentity::new(0), 5);
    assert_eq!(id.scheduler, SchedulerIdentity::new(0));
    assert_eq!(id.index, 5);
    assert_eq!(id.to_string(), "sched-0/5");
}

#[test]
fn test_init_tracing_is_repeatable() {
    prometheus_sched_launcher::util::init_tracing_with_default("prometheus_sched_launcher=debug");
    prometheus_sched_launcher::util::init_tracing();
    assert!(tracing::dispatcher::has_been_set());
}
