//! Plays and the `ansible-playbook` command they render to.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::connection::{DEFAULT_SSH_PORT, Protocol};
use crate::domain::error::ProvisionError;

pub const PLAYBOOK_PROGRAM: &str = "ansible-playbook";

/// Seconds the WinRM readiness probe waits for the host.
pub const WINRM_READY_TIMEOUT_SECS: u32 = 600;

/// Ad-hoc `ansible` call that blocks until every host in `inventory` accepts
/// connections.
#[must_use]
pub fn readiness_command(inventory: &Path) -> String {
    format!(
        "ansible all -i {} -m wait_for_connection -a 'timeout={WINRM_READY_TIMEOUT_SECS}'",
        shell_quote(&inventory.to_string_lossy())
    )
}

// ── Play ─────────────────────────────────────────────────────────────────────

/// One `ansible-playbook` run as declared in the manifest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaybookPlay {
    /// Playbook file passed to `ansible-playbook`.
    pub playbook: PathBuf,
    pub enabled: bool,
    /// Host aliases. The first one names a compute resource; all of them are
    /// used for a resource-less run.
    pub hosts: Vec<String>,
    /// Extra inventory groups, each repeating the host list.
    pub groups: Vec<String>,
    /// Pre-existing inventory; disables inventory generation for this play.
    pub inventory_file: Option<PathBuf>,
    pub extra_vars: BTreeMap<String, serde_yaml::Value>,
    pub tags: Vec<String>,
    pub skip_tags: Vec<String>,
    #[serde(rename = "become")]
    pub become_root: bool,
    pub become_user: Option<String>,
    pub forks: Option<u32>,
    /// Number of `-v` flags, 0 to 4.
    pub verbose: u8,
    #[serde(skip)]
    inventory_override: Option<PathBuf>,
}

impl Default for PlaybookPlay {
    fn default() -> Self {
        Self {
            playbook: PathBuf::new(),
            enabled: true,
            hosts: Vec::new(),
            groups: Vec::new(),
            inventory_file: None,
            extra_vars: BTreeMap::new(),
            tags: Vec::new(),
            skip_tags: Vec::new(),
            become_root: false,
            become_user: None,
            forks: None,
            verbose: 0,
            inventory_override: None,
        }
    }
}

impl PlaybookPlay {
    /// Creates an enabled play for `playbook` with no hosts or groups.
    #[must_use]
    pub fn new(playbook: impl Into<PathBuf>) -> Self {
        Self {
            playbook: playbook.into(),
            ..Self::default()
        }
    }

    /// Effective inventory: the generated override if set, else the declared file.
    #[must_use]
    pub fn effective_inventory(&self) -> Option<&Path> {
        self.inventory_override
            .as_deref()
            .or(self.inventory_file.as_deref())
    }

    pub fn set_inventory_override(&mut self, path: PathBuf) {
        self.inventory_override = Some(path);
    }

    /// Checks the fields a play needs regardless of connection type.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Config`] when the playbook is missing or
    /// `verbose` is out of range.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.playbook.as_os_str().is_empty() {
            return Err(ProvisionError::config("every play needs a playbook"));
        }
        if self.verbose > 4 {
            return Err(ProvisionError::config(format!(
                "verbose must be between 0 and 4 (got {})",
                self.verbose
            )));
        }
        Ok(())
    }

    /// Renders the `ansible-playbook` command line for this play.
    ///
    /// # Errors
    ///
    /// Returns an error if the play has no inventory or its extra vars cannot
    /// be serialized.
    pub fn render_command(&self, params: &ApplyParams) -> Result<String> {
        let inventory = self.effective_inventory().ok_or_else(|| {
            anyhow::anyhow!("play {} has no inventory", self.playbook.display())
        })?;

        let mut cmd = format!(
            "{PLAYBOOK_PROGRAM} {} --inventory-file={}",
            shell_quote(&self.playbook.to_string_lossy()),
            shell_quote(&inventory.to_string_lossy()),
        );

        if params.protocol == Protocol::Ssh {
            let _ = write!(cmd, " --user={}", shell_quote(&params.user));
            if let Some(key) = &params.private_key_file {
                let _ = write!(cmd, " --private-key={}", shell_quote(&key.to_string_lossy()));
            }
            if params.port != DEFAULT_SSH_PORT {
                let _ = write!(
                    cmd,
                    " --extra-vars={}",
                    shell_quote(&format!("ansible_port={}", params.port))
                );
            }
            let _ = write!(
                cmd,
                " --ssh-common-args={}",
                shell_quote(&params.ssh_common_args())
            );
        }

        if !self.extra_vars.is_empty() {
            let json = serde_json::to_string(&self.extra_vars).context("serializing extra_vars")?;
            let _ = write!(cmd, " --extra-vars={}", shell_quote(&json));
        }
        if !self.tags.is_empty() {
            let _ = write!(cmd, " --tags={}", shell_quote(&self.tags.join(",")));
        }
        if !self.skip_tags.is_empty() {
            let _ = write!(cmd, " --skip-tags={}", shell_quote(&self.skip_tags.join(",")));
        }
        if self.become_root {
            cmd.push_str(" --become");
        }
        if let Some(user) = &self.become_user {
            let _ = write!(cmd, " --become-user={}", shell_quote(user));
        }
        if let Some(forks) = self.forks {
            let _ = write!(cmd, " --forks={forks}");
        }
        if self.verbose > 0 {
            let _ = write!(cmd, " -{}", "v".repeat(usize::from(self.verbose)));
        }
        Ok(cmd)
    }
}

// ── Apply parameters ─────────────────────────────────────────────────────────

/// Flat parameter bundle handed to a play by the orchestrator.
#[derive(Debug, Clone)]
pub struct ApplyParams {
    pub protocol: Protocol,
    pub user: String,
    pub port: u16,
    pub private_key_file: Option<PathBuf>,
    /// Known-hosts file for the target; the caller's own file when one is configured.
    pub known_hosts_file: PathBuf,
    pub bastion_known_hosts_file: PathBuf,
    /// `false` when host keys are not verified for this run.
    pub strict_host_key_checking: bool,
    pub bastion: Option<BastionParams>,
}

/// Jump host parameters, present only when a bastion is in use.
#[derive(Debug, Clone)]
pub struct BastionParams {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub private_key_file: Option<PathBuf>,
}

impl ApplyParams {
    /// Value of `--ssh-common-args` for this run.
    ///
    /// Ansible splits it shell-style, so every word that may contain
    /// whitespace is quoted; the proxy command is quoted again because ssh
    /// hands it to a shell of its own.
    #[must_use]
    pub fn ssh_common_args(&self) -> String {
        let strict = if self.strict_host_key_checking { "yes" } else { "no" };
        let mut args = format!(
            "-o StrictHostKeyChecking={strict} -o {}",
            ssh_option("UserKnownHostsFile", &self.known_hosts_file)
        );
        if let Some(b) = &self.bastion {
            let mut proxy = format!("ssh -W %h:%p -p {}", b.port);
            if let Some(key) = &b.private_key_file {
                let _ = write!(proxy, " -i {}", shell_quote(&key.to_string_lossy()));
            }
            let _ = write!(
                proxy,
                " -o StrictHostKeyChecking={strict} -o {} {}",
                ssh_option("UserKnownHostsFile", &self.bastion_known_hosts_file),
                shell_quote(&format!("{}@{}", b.user, b.host))
            );
            let _ = write!(args, " -o {}", shell_quote(&format!("ProxyCommand={proxy}")));
        }
        args
    }
}

/// One `-o key=path` word. ssh itself splits option values on whitespace
/// unless they are double-quoted.
fn ssh_option(key: &str, path: &Path) -> String {
    let path = path.to_string_lossy();
    let value = if path.contains(char::is_whitespace) {
        format!("\"{path}\"")
    } else {
        path.into_owned()
    };
    shell_quote(&format!("{key}={value}"))
}

/// Quotes `s` for a POSIX shell, leaving plain words untouched.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    let plain = !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./=:,@%+".contains(c));
    if plain {
        s.to_string()
    } else {
        format!("'{}'", s.replace('\'', r"'\''"))
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
