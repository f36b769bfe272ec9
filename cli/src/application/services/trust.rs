//! Application service — host trust resolution.
//!
//! Turns a [`TrustPlan`] into the known-hosts lines of each hop, probing the
//! network only for hops whose policy is [`TrustPolicy::Discover`].

use std::path::Path;
use std::time::Duration;

use anyhow::Result;

use crate::application::ports::{HostKeyProbe, ProgressReporter, ScanRequest, Sleeper};
use crate::domain::connection::Endpoint;
use crate::domain::error::ProvisionError;
use crate::domain::known_hosts::TrustLine;
use crate::domain::trust::{DiscoveryLoop, NextAttempt, TrustPlan, TrustPolicy};

/// Known-hosts lines for both hops of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedTrust {
    pub target: Vec<TrustLine>,
    pub bastion: Vec<TrustLine>,
}

/// Everything the resolver needs to know about one run.
pub struct TrustRequest<'a> {
    pub plan: &'a TrustPlan,
    pub target: &'a Endpoint,
    pub bastion: Option<&'a Endpoint>,
    /// Staged bastion private key, used to authenticate the bastion session.
    pub bastion_key_file: Option<&'a Path>,
    /// Discovery ceiling, also the remote `ssh-keyscan` timeout.
    pub ceiling: Duration,
}

/// Resolves the trust lines of the target and, when present, the bastion.
///
/// # Errors
///
/// Returns [`ProvisionError::BastionScan`] if the bastion session fails, or a
/// timeout-class error if direct discovery is exhausted.
pub async fn resolve_trust(
    probe: &impl HostKeyProbe,
    sleeper: &impl Sleeper,
    reporter: &impl ProgressReporter,
    request: &TrustRequest<'_>,
) -> Result<ResolvedTrust> {
    let plan = request.plan;
    let mut resolved = ResolvedTrust {
        target: declared_lines(&plan.target),
        bastion: plan.bastion.as_ref().map(declared_lines).unwrap_or_default(),
    };

    match (plan.needs_bastion_session(), request.bastion) {
        (true, Some(bastion)) => {
            let scan = (plan.target == TrustPolicy::Discover).then(|| ScanRequest {
                host: request.target.host.clone(),
                port: request.target.port,
                timeout: request.ceiling,
            });
            if scan.is_some() {
                reporter.step(&format!(
                    "host key not given, running ssh-keyscan on bastion {}",
                    bastion.display()
                ));
            }
            let report = probe
                .open_bastion(bastion, request.bastion_key_file, scan.as_ref())
                .await
                .map_err(|e| ProvisionError::BastionScan {
                    bastion: bastion.display(),
                    target: request.target.host.clone(),
                    reason: format!("{e:#}"),
                })?;

            if plan.bastion == Some(TrustPolicy::Discover) {
                resolved
                    .bastion
                    .push(TrustLine::for_host(&bastion.host, &report.host_key));
            }
            if let Some(scanned) = report.scanned {
                resolved.target.push(TrustLine::raw(scanned));
            }
        }
        _ if plan.target == TrustPolicy::Discover => {
            let line = discover_direct(probe, sleeper, reporter, request.target, request.ceiling)
                .await?;
            resolved.target.push(line);
        }
        _ => {}
    }

    Ok(resolved)
}

/// Lines a policy contributes without touching the network.
fn declared_lines(policy: &TrustPolicy) -> Vec<TrustLine> {
    match policy {
        TrustPolicy::Declared(Some(line)) => vec![line.clone()],
        TrustPolicy::Disabled
        | TrustPolicy::UserFile(_)
        | TrustPolicy::Declared(None)
        | TrustPolicy::Discover => Vec::new(),
    }
}

/// Reads the target's host key with a direct handshake, retrying on a fixed
/// interval until `ceiling` would be exceeded. Each attempt is cut off at
/// whatever is left of the ceiling.
///
/// # Errors
///
/// Returns [`ProvisionError::NoHostKeyReceived`] if the host answered without
/// a usable key, or [`ProvisionError::TrustDiscoveryTimeout`] otherwise.
pub async fn discover_direct(
    probe: &impl HostKeyProbe,
    sleeper: &impl Sleeper,
    reporter: &impl ProgressReporter,
    target: &Endpoint,
    ceiling: Duration,
) -> Result<TrustLine> {
    discover_with(probe, sleeper, reporter, target, DiscoveryLoop::new(ceiling)).await
}

async fn discover_with(
    probe: &impl HostKeyProbe,
    sleeper: &impl Sleeper,
    reporter: &impl ProgressReporter,
    target: &Endpoint,
    mut attempts: DiscoveryLoop,
) -> Result<TrustLine> {
    reporter.step(&format!("reading host key of {}", target.display()));
    loop {
        let budget = attempts.attempt_budget();
        let started = sleeper.now();
        let outcome = tokio::time::timeout(budget, probe.fetch_host_key(target)).await;
        let spent = sleeper.now().saturating_duration_since(started);

        let responded = match outcome {
            Ok(Ok(Some(key))) => {
                tracing::debug!(host = %target.host, attempts = attempts.attempts() + 1, "host key received");
                return Ok(TrustLine::for_host(&target.host, &key));
            }
            Ok(Ok(None)) => {
                reporter.warn(&format!(
                    "{} answered without a usable host key; retrying...",
                    target.host
                ));
                true
            }
            Ok(Err(e)) => {
                reporter.warn(&format!(
                    "host key for '{}' not received yet; retrying...",
                    target.host
                ));
                tracing::debug!(host = %target.host, error = %format!("{e:#}"), "handshake failed");
                false
            }
            Err(_) => {
                reporter.warn(&format!(
                    "host key for '{}' not received yet; retrying...",
                    target.host
                ));
                tracing::debug!(host = %target.host, ?budget, "handshake attempt abandoned");
                false
            }
        };
        match attempts.record_failure(responded, spent) {
            NextAttempt::RetryAfter(pause) => sleeper.sleep(pause).await,
            NextAttempt::Exhausted => return Err(attempts.exhausted_error(&target.host).into()),
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
