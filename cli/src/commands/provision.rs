//! `hostbridge provision` — stage credentials, resolve host trust, apply plays.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::app::AppContext;
use crate::application::ports::CommandRunner;
use crate::application::services::provision::{self as service, ProvisionPorts};
use crate::domain::connection;
use crate::domain::play::PLAYBOOK_PROGRAM;
use crate::infra::config::YamlManifestStore;

/// Arguments for the provision command.
#[derive(Args)]
pub struct ProvisionArgs {
    /// Provisioning manifest (YAML)
    #[arg(long, short, env = "HOSTBRIDGE_MANIFEST")]
    pub manifest: PathBuf,

    /// Do not check that ansible-playbook is installed before starting
    #[arg(long)]
    pub skip_ansible_check: bool,
}

/// Run `hostbridge provision`.
///
/// # Errors
///
/// Returns an error if the manifest is invalid, trust discovery fails, or any
/// enabled play fails.
pub async fn run(args: &ProvisionArgs, app: &AppContext) -> Result<()> {
    let manifest = YamlManifestStore.load(&args.manifest)?;
    let descriptor = connection::resolve(&manifest.connection)?;
    let mut plays = manifest.plays;
    service::preflight(&descriptor, &plays)?;

    if !args.skip_ansible_check {
        check_ansible(&app.runner).await?;
    }

    let reporter = app.terminal_reporter();
    let target = if descriptor.is_compute_resource() {
        descriptor.target_endpoint().display()
    } else {
        "declared hosts".to_string()
    };
    app.output
        .header(&format!("provisioning {target} over {}", descriptor.protocol));

    let outcome = service::provision(
        &ProvisionPorts {
            probe: &app.probe,
            sleeper: &app.sleeper,
            store: &app.staging,
            applier: &app.applier,
            reporter: &reporter,
        },
        &descriptor,
        &mut plays,
        &manifest.ssh,
    )
    .await?;

    let summary = match outcome.skipped {
        0 => format!("{} play(s) applied", outcome.applied.len()),
        n => format!("{} play(s) applied, {n} disabled", outcome.applied.len()),
    };
    app.output.success(&summary);
    Ok(())
}

async fn check_ansible(runner: &impl CommandRunner) -> Result<()> {
    let output = runner
        .run(PLAYBOOK_PROGRAM, &["--version"])
        .await
        .with_context(|| format!("{PLAYBOOK_PROGRAM} is not available on PATH"))?;
    anyhow::ensure!(
        output.status.success(),
        "{PLAYBOOK_PROGRAM} --version failed: {}",
        String::from_utf8_lossy(&output.stderr).trim()
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    tracing::debug!(version = stdout.lines().next().unwrap_or_default(), "found ansible");
    Ok(())
}
