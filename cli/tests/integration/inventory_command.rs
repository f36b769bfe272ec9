//! Integration tests for `hostbridge inventory`.

#![allow(clippy::expect_used)]

use predicates::prelude::*;
use tempfile::TempDir;

use crate::cli_tests::hostbridge;

fn manifest(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("manifest.yaml");
    std::fs::write(&path, body).expect("write manifest");
    path
}

#[test]
fn test_inventory_prints_ssh_layout() {
    let dir = TempDir::new().expect("tempdir");
    let path = manifest(
        &dir,
        "connection:\n  type: ssh\n  host: 10.0.0.5\nplays:\n  - playbook: site.yml\n    hosts: [web1]\n    groups: [web]\n",
    );
    hostbridge()
        .args(["inventory", "--manifest"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "[host]\nweb1 ansible_host=10.0.0.5\n[host:vars]\n ansible_user=root\n",
        ))
        .stdout(predicate::str::contains("\n[web]\nweb1 ansible_host=10.0.0.5\n"));
}

#[test]
fn test_inventory_prints_winrm_layout_without_ca() {
    let dir = TempDir::new().expect("tempdir");
    let path = manifest(
        &dir,
        "connection:\n  type: winrm\n  host: 10.0.0.9\n  use_ntlm: true\nplays:\n  - playbook: win.yml\n",
    );
    hostbridge()
        .args(["inventory", "--manifest"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[windows]\n 10.0.0.9\n"))
        .stdout(predicate::str::contains(" ansible_winrm_transport=ntlm\n"))
        .stdout(predicate::str::contains(
            " ansible_winrm_server_cert_validation=ignore\n",
        ));
}

#[test]
fn test_inventory_reads_manifest_from_env() {
    let dir = TempDir::new().expect("tempdir");
    let path = manifest(
        &dir,
        "connection:\n  type: ssh\n  host: h\nplays:\n  - playbook: site.yml\n",
    );
    hostbridge()
        .arg("inventory")
        .env("HOSTBRIDGE_MANIFEST", &path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[host]\nh\n"));
}

#[test]
fn test_inventory_empty_connection_type_fails() {
    let dir = TempDir::new().expect("tempdir");
    let path = manifest(&dir, "connection:\n  host: h\nplays:\n  - playbook: site.yml\n");
    hostbridge()
        .args(["inventory", "--manifest"])
        .arg(&path)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("connection type can not be empty"));
}
