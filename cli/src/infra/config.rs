//! Manifest loading from a YAML file on disk.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::domain::config::ProvisionManifest;
use crate::domain::connection::unknown_keys;
use crate::domain::error::ProvisionError;

/// Reads a [`ProvisionManifest`] and normalizes its paths.
pub struct YamlManifestStore;

impl YamlManifestStore {
    /// Loads, expands `~` in every path, and validates each play.
    ///
    /// # Errors
    ///
    /// Returns [`ProvisionError::Config`] if the file does not exist or a play
    /// is invalid, or an error if the file cannot be read or parsed.
    pub fn load(&self, path: &Path) -> Result<ProvisionManifest> {
        if !path.exists() {
            return Err(ProvisionError::config(format!(
                "manifest {} does not exist",
                path.display()
            ))
            .into());
        }
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let mut manifest: ProvisionManifest = serde_yaml::from_str(&content)
            .with_context(|| format!("cannot parse {}", path.display()))?;

        for key in unknown_keys(&manifest.connection) {
            tracing::warn!(key, "ignoring unknown connection attribute");
        }

        if let Some(file) = manifest.ssh.user_known_hosts_file.as_mut() {
            *file = expand(file);
        }
        for play in &mut manifest.plays {
            play.playbook = expand(&play.playbook);
            if let Some(file) = play.inventory_file.as_mut() {
                *file = expand(file);
            }
            play.validate()?;
        }
        Ok(manifest)
    }
}

fn expand(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}
