//! Ansible inventory rendering for SSH and WinRM targets.
//!
//! Pure functions only — no I/O, no async, no filesystem access. The section
//! headers (`[host]`, `[host:vars]`, `[<group>]`, `[windows]`,
//! `[windows:vars]`) are what downstream plays target, so the layout is fixed.

use std::path::Path;

use serde::Serialize;
use tera::{Context, Tera};

use crate::domain::connection::{ConnectionDescriptor, DEFAULT_WINRM_HTTPS_PORT, Protocol};
use crate::domain::error::ProvisionError;

const SSH_TEMPLATE: &str = r"[host]
{% for h in hosts %}{{ h.alias }}{% if h.ansible_host %} ansible_host={{ h.ansible_host }}{% endif %}
{% endfor %}[host:vars]
 ansible_user={{ user }}
 ansible_ssh_common_args='-o StrictHostKeyChecking=no'
{% if password %} ansible_password={{ password }}
{% endif %}{% for g in groups %}
[{{ g }}]
{% for h in hosts %}{{ h.alias }}{% if h.ansible_host %} ansible_host={{ h.ansible_host }}{% endif %}
{% endfor %}{% endfor %}";

const WINRM_TEMPLATE: &str = r"[windows]
 {{ host }}

[windows:vars]
 ansible_user={{ user }}
{% if password %} ansible_password={{ password }}
{% endif %}{% if port %} ansible_port={{ port }}
{% endif %} ansible_connection=winrm
{% if ntlm %} ansible_winrm_transport=ntlm
{% endif %}{% if cacert_file %} ansible_winrm_ca_trust_path={{ cacert_file }}
{% else %} ansible_winrm_server_cert_validation=ignore
{% endif %} ansible_winrm_read_timeout_sec=900
 ansible_winrm_operation_timeout_sec=800
";

/// One line of the `[host]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryHost {
    pub alias: String,
    /// Empty when the alias is itself the address.
    pub ansible_host: String,
}

#[derive(Serialize)]
struct SshData<'a> {
    hosts: Vec<InventoryHost>,
    groups: &'a [String],
    user: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct WinrmData<'a> {
    host: &'a str,
    user: &'a str,
    password: &'a str,
    /// `None` for Ansible's own default port.
    port: Option<u16>,
    ntlm: bool,
    cacert_file: Option<String>,
}

/// Picks the `[host]` entries for an SSH inventory.
///
/// * address and at least one alias: the first alias, pointed at the address;
/// * address and no alias: the address alone;
/// * no address (resource-less run): every declared alias, unchanged.
#[must_use]
pub fn select_ssh_hosts(address: &str, declared: &[String]) -> Vec<InventoryHost> {
    if address.is_empty() {
        return declared
            .iter()
            .filter(|h| !h.is_empty())
            .map(|h| InventoryHost {
                alias: h.clone(),
                ansible_host: String::new(),
            })
            .collect();
    }
    match declared.first().map(String::as_str) {
        Some(alias) if !alias.is_empty() && alias != address => vec![InventoryHost {
            alias: alias.to_string(),
            ansible_host: address.to_string(),
        }],
        _ => vec![InventoryHost {
            alias: address.to_string(),
            ansible_host: String::new(),
        }],
    }
}

/// Renders the inventory for one play.
///
/// `cacert_file` is the staged CA certificate, used by WinRM only.
///
/// # Errors
///
/// Returns [`ProvisionError::Render`] if the template engine fails.
pub fn render(
    descriptor: &ConnectionDescriptor,
    hosts: &[String],
    groups: &[String],
    cacert_file: Option<&Path>,
) -> Result<String, ProvisionError> {
    match descriptor.protocol {
        Protocol::Ssh => render_ssh(descriptor, hosts, groups),
        Protocol::Winrm => render_winrm(descriptor, cacert_file),
    }
}

/// Renders the `[host]` / `[host:vars]` / `[<group>]` layout.
///
/// # Errors
///
/// Returns [`ProvisionError::Render`] if the template engine fails.
pub fn render_ssh(
    descriptor: &ConnectionDescriptor,
    hosts: &[String],
    groups: &[String],
) -> Result<String, ProvisionError> {
    let data = SshData {
        hosts: select_ssh_hosts(&descriptor.host, hosts),
        groups,
        user: &descriptor.user,
        password: &descriptor.password,
    };
    render_template("ssh", SSH_TEMPLATE, &data)
}

/// Renders the `[windows]` / `[windows:vars]` layout.
///
/// # Errors
///
/// Returns [`ProvisionError::Render`] if the template engine fails.
pub fn render_winrm(
    descriptor: &ConnectionDescriptor,
    cacert_file: Option<&Path>,
) -> Result<String, ProvisionError> {
    let data = WinrmData {
        host: &descriptor.host,
        user: &descriptor.user,
        password: &descriptor.password,
        port: (descriptor.port != DEFAULT_WINRM_HTTPS_PORT).then_some(descriptor.port),
        ntlm: descriptor.ntlm,
        cacert_file: cacert_file.map(|p| p.display().to_string()),
    };
    render_template("winrm", WINRM_TEMPLATE, &data)
}

fn render_template(
    shape: &'static str,
    template: &str,
    data: &impl Serialize,
) -> Result<String, ProvisionError> {
    let render_err = |e: tera::Error| ProvisionError::Render {
        shape,
        reason: error_chain(&e),
    };
    let context = Context::from_serialize(data).map_err(render_err)?;
    Tera::one_off(template, &context, false).map_err(render_err)
}

/// Tera nests the useful message in `source()`; flatten it for the user.
fn error_chain(e: &tera::Error) -> String {
    let mut msg = e.to_string();
    let mut source = std::error::Error::source(e);
    while let Some(inner) = source {
        msg.push_str(": ");
        msg.push_str(&inner.to_string());
        source = inner.source();
    }
    msg
}

// ── Unit tests ───────────────────────────────────────────────────────────────
