//! Tests for stopping frpc and its process tree

#![cfg(unix)]

mod common;

use common::{cooperative_frpc, forking_frpc, stubborn_frpc, wait_for_pid, wait_until_gone};
use frp_core::tunnel::process::is_process_alive;
use frp_core::tunnel::{ChildProcessController, Liveness, TerminationOutcome};
use std::time::{Duration, Instant};
use tempfile::tempdir;

#[tokio::test]
async fn test_stubborn_child_is_killed_with_its_tree() {
    let dir = tempdir().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let frpc = stubborn_frpc(dir.path(), &pid_file);
    let config = dir.path().join("frpc.toml");
    std::fs::write(&config, "dummy").unwrap();

    let grace = Duration::from_millis(300);
    let controller = ChildProcessController::new(grace);
    let mut handle = controller.spawn(&frpc, &config).unwrap();
    let child_pid = handle.pid().unwrap();
    let grandchild = wait_for_pid(&pid_file).await;

    let started = Instant::now();
    let outcome = controller.terminate(&mut handle).await;
    let elapsed = started.elapsed();

    assert!(matches!(outcome, TerminationOutcome::Killed(_)));
    assert!(elapsed >= grace, "killed before the grace period: {:?}", elapsed);
    assert!(
        elapsed < grace + Duration::from_secs(2),
        "escalation took too long: {:?}",
        elapsed
    );

    assert_eq!(handle.liveness(), Liveness::Exited);
    assert!(!is_process_alive(child_pid));
    assert!(
        wait_until_gone(grandchild).await,
        "grandchild {} survived the tree kill",
        grandchild
    );
}

#[tokio::test]
async fn test_cooperative_child_stops_gracefully() {
    let dir = tempdir().unwrap();
    let pid_file = dir.path().join("frpc.pid");
    let frpc = cooperative_frpc(dir.path(), &pid_file);
    let config = dir.path().join("frpc.toml");
    std::fs::write(&config, "dummy").unwrap();

    let controller = ChildProcessController::new(Duration::from_secs(5));
    let mut handle = controller.spawn(&frpc, &config).unwrap();
    wait_for_pid(&pid_file).await;

    let started = Instant::now();
    let outcome = controller.terminate(&mut handle).await;

    match outcome {
        TerminationOutcome::Graceful(status) => assert!(!status.success()),
        other => panic!("expected graceful stop, got {:?}", other),
    }
    assert!(started.elapsed() < Duration::from_secs(5));

    // Already stopped, nothing left to do
    assert_eq!(
        controller.terminate(&mut handle).await,
        TerminationOutcome::AlreadyExited
    );
}

#[tokio::test]
async fn test_graceful_stop_sweeps_process_group() {
    let dir = tempdir().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let frpc = forking_frpc(dir.path(), &pid_file);
    let config = dir.path().join("frpc.toml");
    std::fs::write(&config, "dummy").unwrap();

    let controller = ChildProcessController::new(Duration::from_secs(5));
    let mut handle = controller.spawn(&frpc, &config).unwrap();
    let grandchild = wait_for_pid(&pid_file).await;

    // SIGTERM reaches only frpc; the background sleep is left for the sweep
    let outcome = controller.terminate(&mut handle).await;
    assert!(matches!(outcome, TerminationOutcome::Graceful(_)));

    assert!(
        wait_until_gone(grandchild).await,
        "grandchild {} outlived a graceful stop",
        grandchild
    );
}
