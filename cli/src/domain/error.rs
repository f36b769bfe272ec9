//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use thiserror::Error;

// ── Provisioning errors ───────────────────────────────────────────────────────

/// Fatal errors of a provisioning run. Every variant aborts the remaining plays.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// Missing or contradictory input, detected before any I/O.
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Temp-file creation or write failure.
    #[error("Cannot write {what}: {source}")]
    Io {
        what: String,
        #[source]
        source: std::io::Error,
    },

    /// The target never answered an SSH handshake within the ceiling.
    #[error("Host key for '{host}' not received within {seconds} seconds")]
    TrustDiscoveryTimeout { host: String, seconds: u64 },

    /// The target answered the transport but never offered a usable host key.
    #[error("Expected to receive the host key for '{host}', but no host key arrived")]
    NoHostKeyReceived { host: String },

    /// `ssh-keyscan` through the bastion failed.
    #[error("Host key scan of {target} through bastion {bastion} failed: {reason}")]
    BastionScan {
        bastion: String,
        target: String,
        reason: String,
    },

    /// Inventory template rendering failed.
    #[error("Cannot render {shape} inventory: {reason}")]
    Render { shape: &'static str, reason: String },

    /// The external apply step exited with failure.
    #[error("Command failed ({status}): {command}")]
    Apply { command: String, status: String },
}

impl ProvisionError {
    /// Shorthand for [`ProvisionError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Returns `true` for the two bounded-retry exhaustion variants.
    #[must_use]
    pub fn is_timeout_class(&self) -> bool {
        matches!(
            self,
            Self::TrustDiscoveryTimeout { .. } | Self::NoHostKeyReceived { .. }
        )
    }
}
