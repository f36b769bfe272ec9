//! Shared mock infrastructure for unit tests.
//!
//! Hand-written port implementations that record every call so tests can
//! assert on what the orchestrator did, and in which order.

#![allow(clippy::expect_used, clippy::unwrap_used, dead_code)]

use std::collections::VecDeque;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::Result;
use hostbridge_cli::application::ports::{
    BastionReport, CommandApplier, HostKeyProbe, ProgressReporter, ScanRequest, Sleeper,
};
use hostbridge_cli::domain::connection::Endpoint;
use hostbridge_cli::domain::error::ProvisionError;

// ── Reporter ─────────────────────────────────────────────────────────────────

pub struct NoopReporter;

impl ProgressReporter for NoopReporter {
    fn step(&self, _: &str) {}
    fn success(&self, _: &str) {}
    fn warn(&self, _: &str) {}
}

/// Keeps every message, prefixed with its kind.
#[derive(Default)]
pub struct RecordingReporter {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn warnings(&self) -> usize {
        self.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|l| l.starts_with("warn:"))
            .count()
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("success: {message}"));
    }
    fn warn(&self, message: &str) {
        self.lines.lock().unwrap().push(format!("warn: {message}"));
    }
}

// ── Clock ────────────────────────────────────────────────────────────────────

/// Records requested pauses instead of sleeping; its clock only moves when
/// something sleeps.
pub struct FakeSleeper {
    origin: Instant,
    pub pauses: Mutex<Vec<Duration>>,
}

impl Default for FakeSleeper {
    fn default() -> Self {
        Self {
            origin: Instant::now(),
            pauses: Mutex::default(),
        }
    }
}

impl FakeSleeper {
    pub fn total(&self) -> Duration {
        self.pauses.lock().unwrap().iter().sum()
    }
}

impl Sleeper for FakeSleeper {
    async fn sleep(&self, duration: Duration) {
        self.pauses.lock().unwrap().push(duration);
    }

    fn now(&self) -> Instant {
        self.origin + self.total()
    }
}

// ── SSH probe ────────────────────────────────────────────────────────────────

/// One recorded `open_bastion` call.
#[derive(Debug, Clone)]
pub struct BastionCall {
    pub bastion: String,
    /// Content of the key file at call time, if one was passed.
    pub key_material: Option<String>,
    pub scan: Option<(String, u16, Duration)>,
}

/// Replays scripted handshake results.
#[derive(Default)]
pub struct ScriptedProbe {
    /// Direct handshake replies in order; once empty every call fails.
    pub direct: Mutex<VecDeque<Result<Option<String>, String>>>,
    pub direct_calls: Mutex<u32>,
    pub bastion_reply: Mutex<Option<Result<BastionReport, String>>>,
    pub bastion_calls: Mutex<Vec<BastionCall>>,
}

impl ScriptedProbe {
    pub fn unreachable() -> Self {
        Self::default()
    }

    pub fn with_direct(replies: Vec<Result<Option<String>, String>>) -> Self {
        Self {
            direct: Mutex::new(replies.into()),
            ..Self::default()
        }
    }

    pub fn with_bastion(reply: Result<BastionReport, String>) -> Self {
        Self {
            bastion_reply: Mutex::new(Some(reply)),
            ..Self::default()
        }
    }

    pub fn direct_calls(&self) -> u32 {
        *self.direct_calls.lock().unwrap()
    }

    pub fn bastion_calls(&self) -> Vec<BastionCall> {
        self.bastion_calls.lock().unwrap().clone()
    }
}

impl HostKeyProbe for ScriptedProbe {
    async fn fetch_host_key(&self, _: &Endpoint) -> Result<Option<String>> {
        *self.direct_calls.lock().unwrap() += 1;
        match self.direct.lock().unwrap().pop_front() {
            Some(Ok(key)) => Ok(key),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => Err(anyhow::anyhow!("connection refused")),
        }
    }

    async fn open_bastion(
        &self,
        bastion: &Endpoint,
        key_file: Option<&Path>,
        scan: Option<&ScanRequest>,
    ) -> Result<BastionReport> {
        self.bastion_calls.lock().unwrap().push(BastionCall {
            bastion: bastion.display(),
            key_material: key_file.map(|p| std::fs::read_to_string(p).expect("key file")),
            scan: scan.map(|s| (s.host.clone(), s.port, s.timeout)),
        });
        match self.bastion_reply.lock().unwrap().clone() {
            Some(Ok(report)) => Ok(report),
            Some(Err(e)) => Err(anyhow::anyhow!(e)),
            None => anyhow::bail!("no bastion scripted"),
        }
    }
}

// ── Applier ──────────────────────────────────────────────────────────────────

/// A file that existed in the staging directory when a command ran.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub name: String,
    pub path: PathBuf,
    pub content: String,
    /// Permission bits at snapshot time.
    pub mode: u32,
}

/// What the staging directory looked like at one `apply` call.
#[derive(Debug, Clone)]
pub struct ApplyCall {
    pub command: String,
    pub files: Vec<StagedFile>,
}

impl ApplyCall {
    /// The single staged file whose name starts with `hostbridge-<label>-`.
    pub fn file(&self, label: &str) -> &StagedFile {
        let prefix = format!("hostbridge-{label}-");
        let matches: Vec<_> = self.files.iter().filter(|f| f.name.starts_with(&prefix)).collect();
        assert_eq!(matches.len(), 1, "expected one {label} file, got {:?}", self.files);
        matches[0]
    }

    pub fn count(&self, label: &str) -> usize {
        let prefix = format!("hostbridge-{label}-");
        self.files.iter().filter(|f| f.name.starts_with(&prefix)).count()
    }
}

/// Records commands together with a snapshot of the staging directory.
#[derive(Clone)]
pub struct RecordingApplier {
    staging: PathBuf,
    pub calls: Arc<Mutex<Vec<ApplyCall>>>,
    /// Zero-based index of the call that should fail.
    pub fail_at: Option<usize>,
}

impl RecordingApplier {
    pub fn new(staging: &Path) -> Self {
        Self {
            staging: staging.to_path_buf(),
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_at: None,
        }
    }

    pub fn failing_at(staging: &Path, index: usize) -> Self {
        Self {
            fail_at: Some(index),
            ..Self::new(staging)
        }
    }

    pub fn calls(&self) -> Vec<ApplyCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.command).collect()
    }
}

impl CommandApplier for RecordingApplier {
    async fn apply(&self, command: &str) -> Result<()> {
        let files = snapshot(&self.staging);
        let index = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(ApplyCall {
                command: command.to_string(),
                files,
            });
            calls.len() - 1
        };
        if self.fail_at == Some(index) {
            return Err(ProvisionError::Apply {
                command: command.to_string(),
                status: "exit code 2".into(),
            }
            .into());
        }
        Ok(())
    }
}

/// Every regular file in `dir`, sorted by name.
pub fn snapshot(dir: &Path) -> Vec<StagedFile> {
    let mut files: Vec<StagedFile> = std::fs::read_dir(dir)
        .expect("read staging dir")
        .map(|e| e.expect("entry").path())
        .filter(|p| p.is_file())
        .map(|path| StagedFile {
            name: path.file_name().unwrap().to_string_lossy().into_owned(),
            content: std::fs::read_to_string(&path).expect("read staged file"),
            mode: std::fs::metadata(&path).expect("metadata").permissions().mode(),
            path,
        })
        .collect();
    files.sort_by(|a, b| a.name.cmp(&b.name));
    files
}
