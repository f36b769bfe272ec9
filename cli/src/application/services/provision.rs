//! Application service — the provisioning run.
//!
//! Stages credentials, resolves host trust, writes known-hosts and inventory
//! files, then applies every enabled play in order. Every file is owned by a
//! [`TempPath`] guard created where the file is created; guards are declared
//! so that they drop as inventories, then known-hosts, then key/CA files.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempPath;

use crate::application::ports::{
    CommandApplier, EphemeralStore, HostKeyProbe, Play, ProgressReporter, Sleeper,
};
use crate::application::services::trust::{TrustRequest, resolve_trust};
use crate::domain::config::SshSettings;
use crate::domain::connection::{ConnectionDescriptor, Protocol};
use crate::domain::error::ProvisionError;
use crate::domain::play::{ApplyParams, BastionParams, readiness_command};
use crate::domain::trust::{self, TrustPolicy};
use crate::domain::{inventory, known_hosts};

/// Outcome of the `provision` use-case.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionOutcome {
    /// Names of the plays that were applied, in order.
    pub applied: Vec<String>,
    /// Number of disabled plays.
    pub skipped: usize,
}

/// Injected collaborators of a run.
pub struct ProvisionPorts<'a, H, S, E, A, R> {
    pub probe: &'a H,
    pub sleeper: &'a S,
    pub store: &'a E,
    pub applier: &'a A,
    pub reporter: &'a R,
}

/// Key and CA files staged for one run.
struct StagedCredentials {
    bastion_key: Option<TempPath>,
    target_key: Option<TempPath>,
    cacert: Option<TempPath>,
}

/// Checks run before any file is written or any host is contacted.
///
/// # Errors
///
/// Returns [`ProvisionError::Config`] if a resource-less run has a play,
/// enabled or not, with neither hosts nor an inventory file.
pub fn preflight<P: Play>(
    descriptor: &ConnectionDescriptor,
    plays: &[P],
) -> Result<(), ProvisionError> {
    if descriptor.is_compute_resource() {
        return Ok(());
    }
    for play in plays {
        if play.hosts().is_empty() && play.inventory_file().is_none() {
            return Err(ProvisionError::config(format!(
                "play {} needs hosts or an inventory file when no compute resource is targeted",
                play.name()
            )));
        }
    }
    Ok(())
}

/// Runs every enabled play against the described connection.
///
/// # Errors
///
/// Returns the first fatal error; files staged so far are removed before
/// this returns.
pub async fn provision<P, H, S, E, A, R>(
    ports: &ProvisionPorts<'_, H, S, E, A, R>,
    descriptor: &ConnectionDescriptor,
    plays: &mut [P],
    settings: &SshSettings,
) -> Result<ProvisionOutcome>
where
    P: Play,
    H: HostKeyProbe,
    S: Sleeper,
    E: EphemeralStore,
    A: CommandApplier,
    R: ProgressReporter,
{
    let reporter = ports.reporter;

    preflight(descriptor, plays)?;
    let mut settings = settings.clone();
    if !descriptor.is_compute_resource() {
        tracing::debug!("no compute resource; host key checking disabled for this run");
        settings.override_strict_host_key_checking();
    }

    let staged = stage_credentials(ports.store, reporter, descriptor)?;

    let plan = trust::plan(descriptor, &settings);
    let target = descriptor.target_endpoint();
    let bastion = descriptor.bastion_endpoint();
    let resolved = resolve_trust(
        ports.probe,
        ports.sleeper,
        reporter,
        &TrustRequest {
            plan: &plan,
            target: &target,
            bastion: bastion.as_ref(),
            bastion_key_file: staged.bastion_key.as_deref(),
            ceiling: settings.keyscan_timeout(),
        },
    )
    .await?;

    let bastion_known_hosts = ports
        .store
        .write_text(&known_hosts::build(&resolved.bastion), "known-hosts-bastion")?;
    let target_known_hosts = ports
        .store
        .write_text(&known_hosts::build(&resolved.target), "known-hosts-target")?;

    let params = ApplyParams {
        protocol: descriptor.protocol,
        user: descriptor.user.clone(),
        port: descriptor.port,
        private_key_file: staged.target_key.as_deref().map(Path::to_path_buf),
        known_hosts_file: known_hosts_path(&plan.target, &target_known_hosts),
        bastion_known_hosts_file: plan.bastion.as_ref().map_or_else(
            || bastion_known_hosts.to_path_buf(),
            |policy| known_hosts_path(policy, &bastion_known_hosts),
        ),
        strict_host_key_checking: plan.target.is_strict(),
        bastion: descriptor.bastion.as_ref().map(|b| BastionParams {
            host: b.host.clone(),
            port: b.port,
            user: b.user.clone(),
            private_key_file: staged.bastion_key.as_deref().map(Path::to_path_buf),
        }),
    };

    let mut inventories: Vec<TempPath> = Vec::new();
    let mut outcome = ProvisionOutcome::default();

    for play in plays.iter_mut() {
        if !play.enabled() {
            tracing::debug!(play = %play.name(), "play disabled; skipping");
            outcome.skipped += 1;
            continue;
        }

        if play.inventory_file().is_none() {
            let text = inventory::render(
                descriptor,
                play.hosts(),
                play.groups(),
                staged.cacert.as_deref(),
            )?;
            let file = ports.store.write_text(&text, "inventory")?;
            reporter.step(&format!("wrote temporary inventory to {}", file.display()));
            play.set_override_inventory_file(file.to_path_buf());
            inventories.push(file);
        }
        let inventory_file = play
            .inventory_file()
            .map(Path::to_path_buf)
            .context("play has no inventory after generation")?;

        if descriptor.protocol == Protocol::Winrm {
            let probe = readiness_command(&inventory_file);
            reporter.step(&format!("waiting for windows host: {probe}"));
            ports.applier.apply(&probe).await?;
        }

        let command = play.to_command(&params)?;
        reporter.step(&format!("running local command: {command}"));
        ports.applier.apply(&command).await?;
        reporter.success(&format!("play {} applied", play.name()));
        outcome.applied.push(play.name());
    }

    Ok(outcome)
}

/// Writes key and CA material in bastion, target, CA order.
fn stage_credentials(
    store: &impl EphemeralStore,
    reporter: &impl ProgressReporter,
    descriptor: &ConnectionDescriptor,
) -> Result<StagedCredentials> {
    let bastion_key = match &descriptor.bastion {
        Some(b) => store.stage_secret(&b.private_key, "bastion-key")?,
        None => None,
    };
    let target_key = store.stage_secret(&descriptor.private_key, "target-key")?;
    let cacert = store.stage_secret(&descriptor.cacert, "cacert")?;
    for file in [&bastion_key, &target_key, &cacert].into_iter().flatten() {
        reporter.step(&format!("wrote temporary PEM to {}", file.display()));
    }
    Ok(StagedCredentials {
        bastion_key,
        target_key,
        cacert,
    })
}

/// The caller's own file wins over the generated one.
fn known_hosts_path(policy: &TrustPolicy, generated: &TempPath) -> PathBuf {
    match policy {
        TrustPolicy::UserFile(path) => path.clone(),
        _ => generated.to_path_buf(),
    }
}
