//! Connection descriptor — typed view over the raw connection attributes.
//!
//! Pure functions only — no I/O, no async, no filesystem access.

use std::collections::HashMap;
use std::fmt;

use zeroize::Zeroizing;

use crate::domain::error::ProvisionError;

// ── Constants ────────────────────────────────────────────────────────────────

pub const DEFAULT_SSH_PORT: u16 = 22;
pub const DEFAULT_WINRM_HTTP_PORT: u16 = 5985;
pub const DEFAULT_WINRM_HTTPS_PORT: u16 = 5986;
pub const DEFAULT_SSH_USER: &str = "root";
pub const DEFAULT_WINRM_USER: &str = "Administrator";

/// Attribute keys understood by [`resolve`].
pub const CONNECTION_KEYS: &[&str] = &[
    "type",
    "host",
    "port",
    "user",
    "password",
    "private_key",
    "host_key",
    "cacert",
    "https",
    "use_ntlm",
    "bastion_host",
    "bastion_port",
    "bastion_user",
    "bastion_password",
    "bastion_private_key",
    "bastion_host_key",
];

/// Secret string material, wiped from memory on drop.
pub type Secret = Zeroizing<String>;

// ── Protocol ─────────────────────────────────────────────────────────────────

/// Remote management protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protocol {
    Ssh,
    Winrm,
}

impl Protocol {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ssh => "ssh",
            Self::Winrm => "winrm",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Descriptor ───────────────────────────────────────────────────────────────

/// Bastion fields of a descriptor, with target fallbacks already applied.
#[derive(Debug, Clone)]
pub struct BastionDescriptor {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub private_key: Secret,
    pub host_key: String,
}

/// Resolved connection parameters for one provisioning run.
#[derive(Debug, Clone)]
pub struct ConnectionDescriptor {
    pub protocol: Protocol,
    /// Empty for a resource-less run.
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub private_key: Secret,
    /// PEM material of the WinRM CA certificate.
    pub cacert: String,
    pub https: bool,
    pub ntlm: bool,
    pub host_key: String,
    /// Always `None` for WinRM.
    pub bastion: Option<BastionDescriptor>,
}

impl ConnectionDescriptor {
    /// `true` when the run is tied to a concrete compute resource address.
    #[must_use]
    pub fn is_compute_resource(&self) -> bool {
        !self.host.is_empty()
    }

    #[must_use]
    pub fn uses_password(&self) -> bool {
        !self.password.is_empty()
    }

    /// Connectable handle for the target host.
    #[must_use]
    pub fn target_endpoint(&self) -> Endpoint {
        Endpoint {
            host: self.host.clone(),
            port: self.port,
            user: self.user.clone(),
            password: self.password.clone(),
            private_key: self.private_key.clone(),
            host_key: self.host_key.clone(),
        }
    }

    /// Connectable handle for the bastion, `None` when no bastion is in use.
    #[must_use]
    pub fn bastion_endpoint(&self) -> Option<Endpoint> {
        self.bastion.as_ref().map(|b| Endpoint {
            host: b.host.clone(),
            port: b.port,
            user: b.user.clone(),
            password: b.password.clone(),
            private_key: b.private_key.clone(),
            host_key: b.host_key.clone(),
        })
    }
}

/// A host that can be dialed: target or bastion.
#[derive(Debug, Clone)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: Secret,
    pub private_key: Secret,
    /// Pre-known `<type> <base64>` host key, empty when unknown.
    pub host_key: String,
}

impl Endpoint {
    /// `user@host:port`, for diagnostics.
    #[must_use]
    pub fn display(&self) -> String {
        format!("{}@{}:{}", self.user, self.host, self.port)
    }
}

// ── Resolver ─────────────────────────────────────────────────────────────────

/// Builds a [`ConnectionDescriptor`] from raw connection attributes.
///
/// Applies the defaults the resource system would: `root`/`Administrator`
/// users, protocol ports, and bastion fields falling back to the target's.
///
/// # Errors
///
/// Returns [`ProvisionError::Config`] if `type` is empty or unknown, or if a
/// port or flag attribute cannot be parsed.
pub fn resolve(attrs: &HashMap<String, String>) -> Result<ConnectionDescriptor, ProvisionError> {
    let get = |key: &str| attrs.get(key).map_or("", |v| v.trim());

    let protocol = match get("type") {
        "" => return Err(ProvisionError::config("connection type can not be empty")),
        "ssh" => Protocol::Ssh,
        "winrm" => Protocol::Winrm,
        other => {
            return Err(ProvisionError::config(format!(
                "unknown connection type '{other}' (expected ssh or winrm)"
            )));
        }
    };

    let https = parse_flag("https", get("https"))?;
    let default_port = match protocol {
        Protocol::Ssh => DEFAULT_SSH_PORT,
        Protocol::Winrm if https => DEFAULT_WINRM_HTTPS_PORT,
        Protocol::Winrm => DEFAULT_WINRM_HTTP_PORT,
    };
    let port = parse_port("port", get("port"))?.unwrap_or(default_port);

    let user = match get("user") {
        "" => match protocol {
            Protocol::Ssh => DEFAULT_SSH_USER.to_string(),
            Protocol::Winrm => DEFAULT_WINRM_USER.to_string(),
        },
        u => u.to_string(),
    };

    let password = Secret::new(attrs.get("password").cloned().unwrap_or_default());
    let private_key = Secret::new(attrs.get("private_key").cloned().unwrap_or_default());

    let bastion = match (protocol, get("bastion_host")) {
        (Protocol::Ssh, host) if !host.is_empty() => Some(BastionDescriptor {
            host: host.to_string(),
            port: parse_port("bastion_port", get("bastion_port"))?.unwrap_or(port),
            user: non_empty_or(get("bastion_user"), &user),
            password: Secret::new(non_empty_or(
                attrs.get("bastion_password").map_or("", String::as_str),
                &password,
            )),
            private_key: Secret::new(non_empty_or(
                attrs.get("bastion_private_key").map_or("", String::as_str),
                &private_key,
            )),
            host_key: get("bastion_host_key").to_string(),
        }),
        _ => None,
    };

    Ok(ConnectionDescriptor {
        protocol,
        host: get("host").to_string(),
        port,
        user,
        password,
        private_key,
        cacert: attrs.get("cacert").cloned().unwrap_or_default(),
        https,
        ntlm: parse_flag("use_ntlm", get("use_ntlm"))?,
        host_key: get("host_key").to_string(),
        bastion,
    })
}

/// Attribute keys that [`resolve`] does not understand, sorted.
#[must_use]
pub fn unknown_keys(attrs: &HashMap<String, String>) -> Vec<&str> {
    let mut unknown: Vec<&str> = attrs
        .keys()
        .map(String::as_str)
        .filter(|k| !CONNECTION_KEYS.contains(k))
        .collect();
    unknown.sort_unstable();
    unknown
}

fn non_empty_or(value: &str, fallback: &str) -> String {
    let chosen = if value.is_empty() { fallback } else { value };
    chosen.to_string()
}

fn parse_port(key: &str, raw: &str) -> Result<Option<u16>, ProvisionError> {
    if raw.is_empty() {
        return Ok(None);
    }
    match raw.parse::<u16>() {
        Ok(0) | Err(_) => Err(ProvisionError::config(format!(
            "{key} must be a port number between 1 and 65535 (got: {raw:?})"
        ))),
        Ok(port) => Ok(Some(port)),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ProvisionError> {
    match raw.to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" => Ok(false),
        "true" | "1" | "yes" => Ok(true),
        _ => Err(ProvisionError::config(format!(
            "{key} must be true or false (got: {raw:?})"
        ))),
    }
}

// ── Unit tests ───────────────────────────────────────────────────────────────
