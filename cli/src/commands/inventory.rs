//! `hostbridge inventory` — print the inventories a run would generate.
//!
//! Nothing is staged and no host is contacted.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Args;

use crate::application::ports::Play;
use crate::application::services::provision::preflight;
use crate::domain::config::ProvisionManifest;
use crate::domain::connection::{self, ConnectionDescriptor, Secret};
use crate::domain::error::ProvisionError;
use crate::domain::inventory;
use crate::infra::config::YamlManifestStore;

/// Stand-in for the staged CA file path.
const CACERT_PLACEHOLDER: &str = "<staged-cacert>";
/// Printed instead of a declared password.
const REDACTED: &str = "<redacted>";

/// Arguments for the inventory command.
#[derive(Args)]
pub struct InventoryArgs {
    /// Provisioning manifest (YAML)
    #[arg(long, short, env = "HOSTBRIDGE_MANIFEST")]
    pub manifest: PathBuf,

    /// Only render the play at this position (0-based)
    #[arg(long)]
    pub play: Option<usize>,
}

/// Run `hostbridge inventory`.
///
/// # Errors
///
/// Returns an error if the manifest is invalid, `--play` is out of range, or
/// rendering fails.
pub fn run(args: &InventoryArgs) -> Result<()> {
    let manifest = YamlManifestStore.load(&args.manifest)?;
    print!("{}", render_all(&manifest, args.play)?);
    Ok(())
}

/// Renders every selected enabled play, each under a `# play N` comment.
///
/// # Errors
///
/// Returns [`ProvisionError::Config`] on invalid input or an out-of-range
/// `only`, and [`ProvisionError::Render`] if a template fails.
pub fn render_all(manifest: &ProvisionManifest, only: Option<usize>) -> Result<String> {
    let mut descriptor = connection::resolve(&manifest.connection)?;
    preflight(&descriptor, &manifest.plays)?;
    if descriptor.uses_password() {
        descriptor.password = Secret::new(REDACTED.to_string());
    }
    if let Some(index) = only {
        if index >= manifest.plays.len() {
            return Err(ProvisionError::config(format!(
                "--play {index} is out of range ({} play(s) declared)",
                manifest.plays.len()
            ))
            .into());
        }
    }

    let mut out = String::new();
    for (index, play) in manifest.plays.iter().enumerate() {
        if only.is_some_and(|i| i != index) {
            continue;
        }
        let _ = writeln!(out, "# play {index}: {}", play.name());
        if !play.enabled() {
            out.push_str("# disabled\n\n");
            continue;
        }
        if let Some(file) = play.inventory_file() {
            let _ = writeln!(out, "# uses {}\n", file.display());
            continue;
        }
        out.push_str(&render_play(&descriptor, play)?);
        out.push('\n');
    }
    Ok(out)
}

fn render_play(descriptor: &ConnectionDescriptor, play: &impl Play) -> Result<String> {
    let cacert = (!descriptor.cacert.is_empty()).then(|| Path::new(CACERT_PLACEHOLDER));
    Ok(inventory::render(
        descriptor,
        play.hosts(),
        play.groups(),
        cacert,
    )?)
}
