//! Infrastructure layer — concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: process execution, temp-file
//! staging, SSH handshakes, and manifest loading.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod apply;
pub mod clock;
pub mod command_runner;
pub mod config;
pub mod ssh;
pub mod staging;
