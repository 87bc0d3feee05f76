//! Tests for the tokio host adapter

use prometheus_sched_launcher::config::{ExecutionMode, LauncherConfig, RuntimeConfig};
use prometheus_sched_launcher::builders::build_factory;
use prometheus_sched_launcher::core::{LaunchState, Launcher};
use prometheus_sched_launcher::runtime::TokioHost;
use prometheus_sched_launcher::util::SchedulerIdentity;
use std::time::Duration;

fn launcher(mode: ExecutionMode) -> Launcher {
    let cfg = RuntimeConfig::with_mode(mode).with_launcher(
        LauncherConfig::new().with_mode(mode).with_idle_wait_ms(5),
    );
    build_factory(&cfg)
        .unwrap()
        .create(SchedulerIdentity::new(0), 0)
        .unwrap()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_host_join() {
    let mut launcher = launcher(ExecutionMode::Thread);
    launcher.start().unwrap();

    let (tx, rx) = tokio::sync::oneshot::channel();
    let handle = launcher.get_loop().clone();
    launcher
        .get_loop()
        .spawn(move || {
            tx.send(123).unwrap();
            handle.request_shutdown();
            Ok(())
        })
        .unwrap();

    let host = TokioHost::current();
    let completed = tokio::time::timeout(Duration::from_secs(5), host.join(launcher))
        .await
        .expect("join timed out")
        .expect("blocking task");

    assert!(completed.result.is_ok());
    assert_eq!(completed.launcher.state(), LaunchState::Terminated);
    assert_eq!(rx.await.expect("oneshot result"), 123);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_tokio_host_step_to_completion() {
    let Launcher::Manual(manual) = launcher(ExecutionMode::Manual) else {
        panic!("manual factory built a thread launcher");
    };
    let handle = manual.get_loop().clone();

    let host = TokioHost::new(tokio::runtime::Handle::current());
    let pending = tokio::spawn(async move { host.step_to_completion(manual).await });

    tokio::time::sleep(Duration::from_millis(20)).await;
    handle.request_shutdown();

    let completed = tokio::time::timeout(Duration::from_secs(5), pending)
        .await
        .expect("step_to_completion timed out")
        .expect("host task")
        .expect("blocking task");
    assert!(completed.result.is_ok());
    assert_eq!(completed.launcher.state(), LaunchState::Terminated);
}
