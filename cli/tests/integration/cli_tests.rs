//! Integration tests for the CLI surface: help, version, global flags.

#![allow(clippy::expect_used)]

use assert_cmd::Command;
use predicates::prelude::*;

pub fn hostbridge() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("hostbridge"));
    cmd.env("NO_COLOR", "true").env_remove("HOSTBRIDGE_MANIFEST");
    cmd
}

#[test]
fn test_cli_no_args_shows_help_and_exits_two() {
    hostbridge().assert().code(2).stderr(predicate::str::contains(
        "Bootstrap SSH/WinRM host trust and apply Ansible plays",
    ));
}

#[test]
fn test_cli_help_lists_subcommands() {
    hostbridge()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("provision"))
        .stdout(predicate::str::contains("inventory"))
        .stdout(predicate::str::contains("keyscan"));
}

#[test]
fn test_version_command_shows_version() {
    hostbridge()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("hostbridge 0.1.0"));
}

#[test]
fn test_version_command_json_outputs_valid_json() {
    let output = hostbridge()
        .args(["version", "--json"])
        .output()
        .expect("run");
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).expect("json");
    assert_eq!(value["version"], "0.1.0");
}

#[test]
fn test_unknown_subcommand_fails() {
    hostbridge()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(predicate::str::contains("unrecognized subcommand"));
}

#[test]
fn test_keyscan_unreachable_host_times_out() {
    hostbridge()
        .args(["keyscan", "127.0.0.1", "--port", "1", "--timeout", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains(
            "Error: Host key for '127.0.0.1' not received within 0 seconds",
        ));
}
