// Supervisor lifecycle tests against fake daemon binaries
//
// Shell scripts in a tempdir stand in for the ngrok agent, so these
// tests exercise real process spawning without a network. Unix only.

#![cfg(unix)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use ngrokman::{Error, NgrokSupervisor, Platform, Region};
use tokio::time::sleep;

/// Writes an executable shell script standing in for the agent binary.
fn write_fake_binary(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("ngrok");
    std::fs::write(&path, format!("#!/bin/sh\n{body}")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn supervisor_for(binary: PathBuf) -> NgrokSupervisor {
    NgrokSupervisor::new(Platform::Unix, binary)
}

#[tokio::test]
async fn start_records_the_region_wire_code() {
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let binary = write_fake_binary(
        dir.path(),
        &format!("echo \"$@\" > {}\nsleep 30", args_file.display()),
    );

    let supervisor = supervisor_for(binary);
    supervisor.start(Region::Europe).await.unwrap();
    sleep(Duration::from_millis(200)).await;

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert_eq!(args.trim(), "start --none --region eu");

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn second_start_fails_while_a_handle_is_held() {
    let dir = tempfile::tempdir().unwrap();
    let binary = write_fake_binary(dir.path(), "sleep 30");

    let supervisor = supervisor_for(binary);
    supervisor.start(Region::UnitedStates).await.unwrap();

    let err = supervisor.start(Region::UnitedStates).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyRunning));

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn the_guard_holds_even_after_the_process_died() {
    let dir = tempfile::tempdir().unwrap();
    let binary = write_fake_binary(dir.path(), "exit 0");

    let supervisor = supervisor_for(binary);
    supervisor.start(Region::UnitedStates).await.unwrap();
    sleep(Duration::from_millis(200)).await;

    // The process has exited, but the handle is still held.
    let err = supervisor.start(Region::UnitedStates).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyRunning));

    // stop() releases the handle and re-permits starting.
    supervisor.stop().await.unwrap();
    supervisor.start(Region::UnitedStates).await.unwrap();
    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn stop_then_start_cycles_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let binary = write_fake_binary(dir.path(), "sleep 30");

    let supervisor = supervisor_for(binary);
    for _ in 0..3 {
        supervisor.start(Region::Japan).await.unwrap();
        assert!(supervisor.is_running().await);
        supervisor.stop().await.unwrap();
        assert!(!supervisor.is_running().await);
    }
}

#[tokio::test]
async fn logging_start_publishes_the_advertised_address() {
    let dir = tempfile::tempdir().unwrap();
    let binary = write_fake_binary(
        dir.path(),
        "echo 't=2021-01-01T12:00:00 lvl=info msg=\"starting web service\" obj=web addr=http://localhost:30000'\nsleep 30",
    );

    let supervisor = supervisor_for(binary);
    let mut addresses = supervisor.address_changes();
    supervisor.start_with_logging(Region::UnitedStates).await.unwrap();

    tokio::time::timeout(Duration::from_secs(2), addresses.changed())
        .await
        .expect("address should be published")
        .unwrap();
    assert_eq!(
        addresses.borrow().as_deref(),
        Some("http://localhost:30000")
    );
    assert_eq!(
        supervisor.public_address().as_deref(),
        Some("http://localhost:30000")
    );

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn lines_without_an_addr_token_notify_nobody() {
    let dir = tempfile::tempdir().unwrap();
    let binary = write_fake_binary(
        dir.path(),
        "echo 'lvl=info msg=\"client session established\"'\nsleep 30",
    );

    let supervisor = supervisor_for(binary);
    let mut addresses = supervisor.address_changes();
    supervisor.start_with_logging(Region::UnitedStates).await.unwrap();

    let changed = tokio::time::timeout(Duration::from_millis(400), addresses.changed()).await;
    assert!(changed.is_err(), "no notification expected");
    assert!(supervisor.public_address().is_none());

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn register_authtoken_invokes_the_config_subcommand() {
    let dir = tempfile::tempdir().unwrap();
    let args_file = dir.path().join("args.txt");
    let binary = write_fake_binary(
        dir.path(),
        &format!("echo \"$@\" > {}", args_file.display()),
    );

    let supervisor = supervisor_for(binary);
    supervisor.register_authtoken("secret-token").await.unwrap();

    let args = std::fs::read_to_string(&args_file).unwrap();
    assert_eq!(args.trim(), "config add-authtoken secret-token");
}

#[tokio::test]
async fn register_authtoken_is_refused_while_running() {
    let dir = tempfile::tempdir().unwrap();
    let binary = write_fake_binary(dir.path(), "sleep 30");

    let supervisor = supervisor_for(binary);
    supervisor.start(Region::UnitedStates).await.unwrap();

    let err = supervisor.register_authtoken("secret-token").await.unwrap_err();
    assert!(matches!(err, Error::RegisterWhileRunning));

    supervisor.stop().await.unwrap();
}

#[tokio::test]
async fn register_authtoken_surfaces_a_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let binary = write_fake_binary(dir.path(), "exit 1");

    let supervisor = supervisor_for(binary);
    let err = supervisor.register_authtoken("secret-token").await.unwrap_err();
    assert!(matches!(err, Error::Registration { .. }));
}
