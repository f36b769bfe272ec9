//! Temp-file staging — implements `EphemeralStore`.
//!
//! Every file lands in one injected directory with a unique name and is
//! handed back as a [`TempPath`], which removes it on drop.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Result;
use tempfile::{Builder, TempPath};

use crate::application::ports::EphemeralStore;
use crate::domain::error::ProvisionError;

const SECRET_MODE: u32 = 0o600;
const TEXT_MODE: u32 = 0o644;

/// Staging area rooted at a caller-chosen directory.
#[derive(Debug, Clone)]
pub struct TempArea {
    dir: PathBuf,
}

impl TempArea {
    #[must_use]
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Staging area in the system temp directory.
    #[must_use]
    pub fn system() -> Self {
        Self::new(std::env::temp_dir())
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, content: &str, label: &str, mode: u32) -> Result<TempPath, ProvisionError> {
        let io_err = |source: std::io::Error| ProvisionError::Io {
            what: format!("temporary {label} file in {}", self.dir.display()),
            source,
        };
        let mut file = Builder::new()
            .prefix(&format!("hostbridge-{label}-"))
            .tempfile_in(&self.dir)
            .map_err(io_err)?;
        set_permissions(file.path(), mode).map_err(io_err)?;
        file.write_all(content.as_bytes()).map_err(io_err)?;
        file.as_file().sync_all().map_err(io_err)?;
        tracing::debug!(path = %file.path().display(), label, "staged temporary file");
        Ok(file.into_temp_path())
    }
}

impl EphemeralStore for TempArea {
    fn stage_secret(&self, material: &str, label: &str) -> Result<Option<TempPath>> {
        if material.is_empty() {
            return Ok(None);
        }
        Ok(Some(self.write(material, label, SECRET_MODE)?))
    }

    fn write_text(&self, content: &str, label: &str) -> Result<TempPath> {
        Ok(self.write(content, label, TEXT_MODE)?)
    }
}

#[cfg(unix)]
fn set_permissions(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_permissions(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}
