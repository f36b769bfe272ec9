//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain` — never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::{Duration, Instant};

use anyhow::Result;
use tempfile::TempPath;

use crate::domain::connection::Endpoint;
use crate::domain::play::{ApplyParams, PlaybookPlay};

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output, killing it after the
    /// implementation's default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with inherited stdio and return only its exit status.
    async fn run_status(&self, program: &str, args: &[&str]) -> Result<std::process::ExitStatus>;
}

/// The external apply primitive: executes a fully formed shell command.
#[allow(async_fn_in_trait)]
pub trait CommandApplier {
    /// Run `command` on the local machine.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be started or exits non-zero.
    async fn apply(&self, command: &str) -> Result<()>;
}

// ── SSH Probe Port ────────────────────────────────────────────────────────────

/// What a bastion session should do besides reading the bastion's own key.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub host: String,
    pub port: u16,
    /// Per-host timeout handed to `ssh-keyscan -T`.
    pub timeout: Duration,
}

/// Result of one bastion session.
#[derive(Debug, Clone)]
pub struct BastionReport {
    /// `<key-type> <base64>` of the bastion itself.
    pub host_key: String,
    /// Verbatim `ssh-keyscan` output for the target, when a scan was requested.
    pub scanned: Option<String>,
}

/// Abstracts SSH handshakes so trust discovery can be tested offline.
#[allow(async_fn_in_trait)]
pub trait HostKeyProbe {
    /// Handshake with `target` and return the offered host key as
    /// `<key-type> <base64>`. `Ok(None)` means the transport answered but no
    /// usable key was offered.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot be reached or the handshake fails.
    async fn fetch_host_key(&self, target: &Endpoint) -> Result<Option<String>>;

    /// Open an authenticated session to `bastion`, read its host key and,
    /// when `scan` is set, run `ssh-keyscan` against the target through it.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be opened, authentication
    /// fails, or the scan produces no key lines.
    async fn open_bastion(
        &self,
        bastion: &Endpoint,
        key_file: Option<&Path>,
        scan: Option<&ScanRequest>,
    ) -> Result<BastionReport>;
}

// ── Clock Port ────────────────────────────────────────────────────────────────

/// Abstracts waiting and the monotonic clock so retry loops can be tested
/// without wall-clock delay.
#[allow(async_fn_in_trait)]
pub trait Sleeper {
    async fn sleep(&self, duration: Duration);
    /// Current reading of a monotonic clock; only differences are meaningful.
    fn now(&self) -> Instant;
}

// ── Ephemeral File Port ───────────────────────────────────────────────────────

/// Creates short-lived files that are deleted when the returned guard drops.
pub trait EphemeralStore {
    /// Write secret material to an owner-only file. Empty material creates
    /// nothing and returns `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn stage_secret(&self, material: &str, label: &str) -> Result<Option<TempPath>>;

    /// Write world-readable text (inventory, known-hosts).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written.
    fn write_text(&self, content: &str, label: &str) -> Result<TempPath>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait — no async needed.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
}

// ── Play Port ─────────────────────────────────────────────────────────────────

/// A unit of configuration work as seen by the orchestrator.
///
/// Plays never see bastion or trust internals; they get a flat
/// [`ApplyParams`] bundle and render their own command.
pub trait Play {
    /// Short label for diagnostics.
    fn name(&self) -> String;
    fn enabled(&self) -> bool;
    fn hosts(&self) -> &[String];
    fn groups(&self) -> &[String];
    /// Inventory in effect: the override if one was set, else the declared file.
    fn inventory_file(&self) -> Option<&Path>;
    fn set_override_inventory_file(&mut self, path: PathBuf);
    /// Render the command that applies this play.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be rendered.
    fn to_command(&self, params: &ApplyParams) -> Result<String>;
}

impl Play for PlaybookPlay {
    fn name(&self) -> String {
        self.playbook.display().to_string()
    }

    fn enabled(&self) -> bool {
        self.enabled
    }

    fn hosts(&self) -> &[String] {
        &self.hosts
    }

    fn groups(&self) -> &[String] {
        &self.groups
    }

    fn inventory_file(&self) -> Option<&Path> {
        self.effective_inventory()
    }

    fn set_override_inventory_file(&mut self, path: PathBuf) {
        self.set_inventory_override(path);
    }

    fn to_command(&self, params: &ApplyParams) -> Result<String> {
        self.render_command(params)
    }
}
