//! Host-key trust policies and the discovery retry state machine.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::config::SshSettings;
use crate::domain::connection::{ConnectionDescriptor, Endpoint, Protocol};
use crate::domain::error::ProvisionError;
use crate::domain::known_hosts::TrustLine;

/// Pause between two direct handshake attempts.
pub const DISCOVERY_INTERVAL: Duration = Duration::from_secs(5);

/// Floor for one attempt, so a spent ceiling still allows a last try.
pub const MIN_ATTEMPT_BUDGET: Duration = Duration::from_secs(1);

// ── Policies ─────────────────────────────────────────────────────────────────

/// How the host key of one hop (target or bastion) is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrustPolicy {
    /// Host keys are not checked for this hop.
    Disabled,
    /// The caller's known-hosts file is used as is.
    UserFile(PathBuf),
    /// Key declared up front. `None` when only a password was declared.
    Declared(Option<TrustLine>),
    /// Key must be read from the network.
    Discover,
}

impl TrustPolicy {
    /// `true` when the apply step should run with `StrictHostKeyChecking=yes`.
    #[must_use]
    pub fn is_strict(&self) -> bool {
        !matches!(self, Self::Disabled | Self::Declared(None))
    }
}

/// Policies for every hop of a run, decided once before any I/O.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustPlan {
    pub target: TrustPolicy,
    /// `None` when no bastion is in use.
    pub bastion: Option<TrustPolicy>,
}

impl TrustPlan {
    /// `true` when either hop needs a session to the bastion.
    #[must_use]
    pub fn needs_bastion_session(&self) -> bool {
        self.bastion.is_some()
            && (self.target == TrustPolicy::Discover
                || self.bastion.as_ref() == Some(&TrustPolicy::Discover))
    }
}

/// Decides the trust policy of the target and, if present, the bastion.
///
/// WinRM runs and resource-less runs never verify SSH host keys.
#[must_use]
pub fn plan(descriptor: &ConnectionDescriptor, settings: &SshSettings) -> TrustPlan {
    if descriptor.protocol == Protocol::Winrm {
        return TrustPlan {
            target: TrustPolicy::Disabled,
            bastion: None,
        };
    }

    let target = if descriptor.is_compute_resource() {
        hop_policy(&descriptor.target_endpoint(), settings, true)
    } else {
        TrustPolicy::Disabled
    };
    let bastion = descriptor
        .bastion_endpoint()
        .map(|b| hop_policy(&b, settings, false));

    TrustPlan { target, bastion }
}

/// A bastion's password never replaces its key: the session that
/// authenticates with it yields the key for free.
fn hop_policy(endpoint: &Endpoint, settings: &SshSettings, password_skips: bool) -> TrustPolicy {
    if settings.insecure_no_strict_host_key_checking {
        return TrustPolicy::Disabled;
    }
    if let Some(file) = &settings.user_known_hosts_file {
        return TrustPolicy::UserFile(file.clone());
    }
    if !endpoint.host_key.is_empty() {
        return TrustPolicy::Declared(Some(TrustLine::for_host(
            &endpoint.host,
            &endpoint.host_key,
        )));
    }
    if password_skips && !endpoint.password.is_empty() {
        return TrustPolicy::Declared(None);
    }
    TrustPolicy::Discover
}

// ── Discovery loop ───────────────────────────────────────────────────────────

/// Next step after a failed handshake attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextAttempt {
    /// Sleep for the given duration, then try again.
    RetryAfter(Duration),
    /// The ceiling would be exceeded; give up.
    Exhausted,
}

/// Bounded retry bookkeeping for direct host-key discovery.
///
/// Both the pauses and the time spent inside each attempt count against the
/// ceiling; the loop gives up as soon as one more interval would push it past.
#[derive(Debug, Clone)]
pub struct DiscoveryLoop {
    interval: Duration,
    ceiling: Duration,
    elapsed: Duration,
    attempts: u32,
    host_responded: bool,
}

impl DiscoveryLoop {
    #[must_use]
    pub fn new(ceiling: Duration) -> Self {
        Self::with_interval(ceiling, DISCOVERY_INTERVAL)
    }

    #[must_use]
    pub fn with_interval(ceiling: Duration, interval: Duration) -> Self {
        Self {
            interval,
            ceiling,
            elapsed: Duration::ZERO,
            attempts: 0,
            host_responded: false,
        }
    }

    /// How long the next attempt may take: what is left of the ceiling, but
    /// never less than [`MIN_ATTEMPT_BUDGET`].
    #[must_use]
    pub fn attempt_budget(&self) -> Duration {
        self.ceiling
            .saturating_sub(self.elapsed)
            .max(MIN_ATTEMPT_BUDGET)
    }

    /// Records a failed attempt that took `spent`. `responded` is `true` when
    /// the host answered on the transport but offered no usable key.
    pub fn record_failure(&mut self, responded: bool, spent: Duration) -> NextAttempt {
        self.attempts += 1;
        self.host_responded |= responded;
        self.elapsed += spent;
        let next = self.elapsed + self.interval;
        if next > self.ceiling {
            NextAttempt::Exhausted
        } else {
            self.elapsed = next;
            NextAttempt::RetryAfter(self.interval)
        }
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Attempt time plus pauses so far.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// The fatal error reported once the loop is exhausted.
    #[must_use]
    pub fn exhausted_error(&self, host: &str) -> ProvisionError {
        if self.host_responded {
            ProvisionError::NoHostKeyReceived {
                host: host.to_string(),
            }
        } else {
            ProvisionError::TrustDiscoveryTimeout {
                host: host.to_string(),
                seconds: self.ceiling.as_secs(),
            }
        }
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
