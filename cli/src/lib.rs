//! hostbridge — SSH/WinRM trust bootstrap and Ansible play runner.
//!
//! Exposes the layers for integration testing; the binary is a thin wrapper
//! around [`cli::Cli`].

#![cfg_attr(test, allow(clippy::expect_used))]

pub mod app;
pub mod application;
pub mod cli;
pub mod commands;
pub mod domain;
pub mod infra;
pub mod output;
