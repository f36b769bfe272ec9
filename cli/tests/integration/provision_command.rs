//! Integration tests for `hostbridge provision`.
//!
//! Host keys are always declared so no test touches the network; the apply
//! step fails or is skipped, which is enough to observe ordering and cleanup.

#![allow(clippy::expect_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::cli_tests::hostbridge;

fn manifest(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("manifest.yaml");
    std::fs::write(&path, body).expect("write manifest");
    path
}

fn staged_files(dir: &TempDir) -> usize {
    std::fs::read_dir(dir.path()).expect("ls").count()
}

#[test]
fn test_provision_missing_manifest_is_config_error() {
    hostbridge()
        .args(["provision", "--manifest", "/nonexistent/hostbridge.yaml"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Invalid configuration: manifest /nonexistent/hostbridge.yaml does not exist",
        ));
}

#[test]
fn test_provision_resource_less_play_without_hosts_writes_nothing() {
    let input = TempDir::new().expect("tempdir");
    let staging = TempDir::new().expect("tempdir");
    let path = manifest(
        &input,
        "connection:\n  type: ssh\n  private_key: PEM\nplays:\n  - playbook: site.yml\n",
    );
    hostbridge()
        .args(["provision", "--manifest"])
        .arg(&path)
        .arg("--temp-dir")
        .arg(staging.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("needs hosts or an inventory file"));
    assert_eq!(staged_files(&staging), 0);
}

#[test]
fn test_provision_all_plays_disabled_succeeds_and_cleans_up() {
    let input = TempDir::new().expect("tempdir");
    let staging = TempDir::new().expect("tempdir");
    let path = manifest(
        &input,
        "connection:\n  type: ssh\n  host: 10.0.0.5\n  host_key: ssh-ed25519 AAAA\n  private_key: PEM\n\
         plays:\n  - playbook: site.yml\n    enabled: false\n",
    );
    hostbridge()
        .args(["provision", "--skip-ansible-check", "--manifest"])
        .arg(&path)
        .arg("--temp-dir")
        .arg(staging.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("0 play(s) applied, 1 disabled"));
    assert_eq!(staged_files(&staging), 0);
}

#[test]
fn test_provision_quiet_suppresses_progress() {
    let input = TempDir::new().expect("tempdir");
    let staging = TempDir::new().expect("tempdir");
    let path = manifest(
        &input,
        "connection:\n  type: ssh\n  host: h\n  host_key: ssh-ed25519 AAAA\n\
         plays:\n  - playbook: site.yml\n    enabled: false\n",
    );
    hostbridge()
        .args(["--quiet", "provision", "--skip-ansible-check", "--manifest"])
        .arg(&path)
        .arg("--temp-dir")
        .arg(staging.path())
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}

#[test]
fn test_provision_failed_play_aborts_and_removes_staged_files() {
    let input = TempDir::new().expect("tempdir");
    let staging = TempDir::new().expect("tempdir");
    let path = manifest(
        &input,
        "connection:\n  type: ssh\n  host: 10.0.0.5\n  host_key: ssh-ed25519 AAAA\n  private_key: PEM\n\
         plays:\n  - playbook: /nonexistent/site.yml\n",
    );
    hostbridge()
        .args(["provision", "--skip-ansible-check", "--manifest"])
        .arg(&path)
        .arg("--temp-dir")
        .arg(staging.path())
        .env("PATH", "/nonexistent-bin:/usr/bin:/bin")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Error: Command failed"));
    assert_eq!(staged_files(&staging), 0);
}
