//! Integration tests for the frpc supervisor
//!
//! Runs the supervisor against stand-in executables and checks that the
//! transient config always disappears. Signal driven runs live in
//! `signal_tests.rs` because signals reach every test in a binary.

#![cfg(unix)]

mod common;

use common::{copying_frpc, leftover_configs};
use frp_core::error::SupervisorError;
use frp_core::tunnel::{ConfigSource, RunOutcome, Supervisor, SupervisorState};
use tempfile::tempdir;

#[tokio::test]
async fn test_natural_exit_cleans_up() {
    let temp = tempdir().unwrap();
    let mut supervisor = Supervisor::new("true").with_temp_dir(temp.path());
    assert_eq!(supervisor.executable(), std::path::Path::new("true"));

    let report = supervisor
        .run(ConfigSource::Text("dummy".to_string()))
        .await
        .unwrap();

    match report.outcome {
        RunOutcome::ChildExited { status } => assert!(status.unwrap().success()),
        other => panic!("expected natural exit, got {:?}", other),
    }
    assert_eq!(report.outcome.exit_code(), 0);
    assert!(!report.outcome.was_interrupted());
    assert!(report.pid.is_some());
    assert!(!report.config_path.exists());
    assert!(leftover_configs(temp.path()).is_empty());

    assert_eq!(
        supervisor.history(),
        &[
            SupervisorState::Idle,
            SupervisorState::Materializing,
            SupervisorState::Spawned,
            SupervisorState::Running,
            SupervisorState::Cleaned,
        ]
    );
}

#[tokio::test]
async fn test_child_exit_code_is_passed_through() {
    let temp = tempdir().unwrap();
    let mut supervisor = Supervisor::new("false").with_temp_dir(temp.path());

    let report = supervisor
        .run(ConfigSource::Text("dummy".to_string()))
        .await
        .unwrap();

    assert_eq!(report.outcome.exit_code(), 1);
    assert_eq!(supervisor.state(), SupervisorState::Cleaned);
    assert!(leftover_configs(temp.path()).is_empty());
}

#[tokio::test]
async fn test_frpc_receives_rendered_config() {
    let scripts = tempdir().unwrap();
    let temp = tempdir().unwrap();
    let copy = scripts.path().join("seen.toml");
    let frpc = copying_frpc(scripts.path(), &copy, 3);

    let text = "serverAddr = \"127.0.0.1\"\nserverPort = 7000\n";
    let mut supervisor = Supervisor::new(&frpc).with_temp_dir(temp.path());
    let report = supervisor
        .run(ConfigSource::Text(text.to_string()))
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&copy).unwrap(), text);
    assert_eq!(report.outcome.exit_code(), 3);
    assert!(leftover_configs(temp.path()).is_empty());
}

#[tokio::test]
async fn test_saved_profile_is_copied_not_consumed() {
    let scripts = tempdir().unwrap();
    let temp = tempdir().unwrap();
    let copy = scripts.path().join("seen.toml");
    let frpc = copying_frpc(scripts.path(), &copy, 0);

    let saved = scripts.path().join("web.toml");
    std::fs::write(&saved, "[[proxies]]\nname = \"web\"\n").unwrap();

    let mut supervisor = Supervisor::new(&frpc).with_temp_dir(temp.path());
    let report = supervisor
        .run(ConfigSource::File(saved.clone()))
        .await
        .unwrap();

    assert_ne!(report.config_path, saved);
    assert_eq!(
        std::fs::read_to_string(&copy).unwrap(),
        "[[proxies]]\nname = \"web\"\n"
    );
    assert!(saved.exists(), "saved profile must survive the run");
    assert!(leftover_configs(temp.path()).is_empty());
}

#[tokio::test]
async fn test_missing_executable_aborts_and_cleans_up() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("frpinit").join("frpc");
    let mut supervisor = Supervisor::new(&missing).with_temp_dir(temp.path());

    let err = supervisor
        .run(ConfigSource::Text("dummy".to_string()))
        .await
        .unwrap_err();

    assert!(err.to_string().contains(&missing.display().to_string()));
    match err {
        SupervisorError::ExecutableNotFound { path } => assert_eq!(path, missing),
        other => panic!("expected ExecutableNotFound, got {:?}", other),
    }

    assert_eq!(supervisor.state(), SupervisorState::Cleaned);
    assert_eq!(
        supervisor.history(),
        &[
            SupervisorState::Idle,
            SupervisorState::Materializing,
            SupervisorState::Aborted,
            SupervisorState::Cleaned,
        ]
    );
    assert!(leftover_configs(temp.path()).is_empty());
}

#[tokio::test]
async fn test_unreadable_profile_never_spawns() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("gone.toml");
    let mut supervisor = Supervisor::new("true").with_temp_dir(temp.path());

    let err = supervisor
        .run(ConfigSource::File(missing.clone()))
        .await
        .unwrap_err();

    assert!(matches!(err, SupervisorError::Io { ref path, .. } if *path == missing));
    assert!(supervisor.history().contains(&SupervisorState::Aborted));
    assert!(!supervisor.history().contains(&SupervisorState::Spawned));
    assert_eq!(supervisor.state(), SupervisorState::Cleaned);
}

#[tokio::test]
async fn test_unwritable_temp_dir_never_spawns() {
    let temp = tempdir().unwrap();
    let not_a_dir = temp.path().join("file");
    std::fs::write(&not_a_dir, "").unwrap();

    let mut supervisor = Supervisor::new("true").with_temp_dir(&not_a_dir);
    let err = supervisor
        .run(ConfigSource::Text("dummy".to_string()))
        .await
        .unwrap_err();

    assert!(matches!(err, SupervisorError::Io { .. }));
    assert!(!supervisor.history().contains(&SupervisorState::Spawned));
    assert_eq!(supervisor.state(), SupervisorState::Cleaned);
}

#[tokio::test]
async fn test_supervisor_can_run_again_after_cleanup() {
    let temp = tempdir().unwrap();
    let mut supervisor = Supervisor::new("true").with_temp_dir(temp.path());

    for _ in 0..2 {
        let report = supervisor
            .run(ConfigSource::Text("dummy".to_string()))
            .await
            .unwrap();
        assert_eq!(report.outcome.exit_code(), 0);
        assert_eq!(supervisor.state(), SupervisorState::Cleaned);
    }

    // History only covers the latest run
    assert_eq!(
        supervisor
            .history()
            .iter()
            .filter(|state| **state == SupervisorState::Spawned)
            .count(),
        1
    );
    assert!(leftover_configs(temp.path()).is_empty());
}
