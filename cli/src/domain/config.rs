//! Domain types for the provisioning manifest.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::play::PlaybookPlay;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_KEYSCAN_TIMEOUT_SECS: u64 = 60;

// ── Manifest schema ──────────────────────────────────────────────────────────

/// Top-level document consumed by `hostbridge provision`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ProvisionManifest {
    /// Raw connection attributes (`type`, `host`, `bastion_host`, ...).
    #[serde(deserialize_with = "scalar_map")]
    pub connection: HashMap<String, String>,
    /// Plays, applied in declaration order.
    pub plays: Vec<PlaybookPlay>,
    /// Host-key trust settings.
    pub ssh: SshSettings,
}

/// Host-key trust settings shared by every play of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    /// Disables all trust discovery; plays run with `StrictHostKeyChecking=no`.
    pub insecure_no_strict_host_key_checking: bool,
    /// Caller-supplied known-hosts file used instead of discovery.
    pub user_known_hosts_file: Option<PathBuf>,
    /// Ceiling for the host-key discovery retry loop.
    pub ssh_keyscan_timeout_seconds: u64,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            insecure_no_strict_host_key_checking: false,
            user_known_hosts_file: None,
            ssh_keyscan_timeout_seconds: DEFAULT_KEYSCAN_TIMEOUT_SECS,
        }
    }
}

impl SshSettings {
    /// Forces `StrictHostKeyChecking=no` for the rest of the run.
    pub fn override_strict_host_key_checking(&mut self) {
        self.insecure_no_strict_host_key_checking = true;
    }

    #[must_use]
    pub fn keyscan_timeout(&self) -> Duration {
        Duration::from_secs(self.ssh_keyscan_timeout_seconds)
    }
}

/// Accepts YAML scalars of any kind (`port: 22`, `https: true`) and keeps
/// their string form; `null` becomes the empty string.
fn scalar_map<'de, D: Deserializer<'de>>(d: D) -> Result<HashMap<String, String>, D::Error> {
    let raw = HashMap::<String, serde_yaml::Value>::deserialize(d)?;
    raw.into_iter()
        .map(|(key, value)| {
            let text = match value {
                serde_yaml::Value::Null => String::new(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::String(s) => s,
                _ => {
                    return Err(D::Error::custom(format!(
                        "connection.{key} must be a string, number or boolean"
                    )));
                }
            };
            Ok((key, text))
        })
        .collect()
}

// ── Unit tests ───────────────────────────────────────────────────────────────
