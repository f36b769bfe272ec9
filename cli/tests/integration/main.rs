//! Integration tests for hostbridge CLI
//!
//! These tests spawn the actual binary and test end-to-end behavior.
//! None of them needs Ansible or a reachable SSH host.

mod cli_tests;
mod inventory_command;
mod provision_command;
