//! Supervisor Signal Tests
//!
//! Real `sh` children stand in for the daemon:
//! - The daemon's exit code becomes ours
//! - A termination signal is forwarded and awaited
//! - A daemon that ignores it is killed after the grace period
//! - The setup-phase daemon never outlives a failed readiness wait

use std::path::Path;
use std::time::Duration;

use mysqld_orchestrator::supervisor::{
    shutdown_channel, DaemonSupervisor, LocalDaemon, SupervisorError,
};

fn sh(script: &str) -> DaemonSupervisor {
    DaemonSupervisor::new("sh", vec!["-c".to_string(), script.to_string()])
}

#[tokio::test]
async fn test_exit_code_passes_through() {
    let (_trigger, signal) = shutdown_channel();
    assert_eq!(sh("exit 0").run(signal.clone()).await.unwrap(), 0);
    assert_eq!(sh("exit 3").run(signal).await.unwrap(), 3);
}

#[tokio::test]
async fn test_forwarded_signal_lets_daemon_finish() {
    let (trigger, signal) = shutdown_channel();
    let supervised = tokio::spawn(async move {
        sh("trap 'exit 0' TERM; while true; do sleep 0.05; done")
            .with_grace(Duration::from_secs(5))
            .run(signal)
            .await
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    trigger.trigger(15);

    assert_eq!(supervised.await.unwrap().unwrap(), 0);
}

#[tokio::test]
async fn test_stubborn_daemon_is_killed() {
    let (trigger, signal) = shutdown_channel();
    let supervised = tokio::spawn(async move {
        sh("trap '' TERM; while true; do sleep 0.05; done")
            .with_grace(Duration::from_millis(200))
            .run(signal)
            .await
    });

    tokio::time::sleep(Duration::from_millis(300)).await;
    trigger.trigger(15);

    assert_eq!(supervised.await.unwrap().unwrap(), 137);
}

#[test]
fn test_setup_daemon_signal_during_readiness_wait() {
    let (trigger, signal) = shutdown_channel();
    let mut local = LocalDaemon::spawn(
        Path::new("sh"),
        &["-c".to_string(), "sleep 5".to_string()],
        Path::new("/nonexistent/mysql.sock"),
        Duration::from_millis(200),
    )
    .unwrap();
    trigger.trigger(2);

    let err = local
        .wait_ready_with(Duration::from_secs(5), &signal, |_| {
            Err::<(), _>(mysqld_orchestrator::admin::AdminError::Connect {
                target: "/nonexistent/mysql.sock".to_string(),
                reason: "refused".to_string(),
            })
        })
        .unwrap_err();

    assert!(matches!(err, SupervisorError::Interrupted { signal: 2 }));
}
