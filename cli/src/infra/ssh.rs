//! SSH handshakes over libssh2 — implements `HostKeyProbe`.
//!
//! libssh2 is blocking, so every session runs on tokio's blocking pool.

use std::io::Read;
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use ssh2::{ErrorCode, HostKeyType, Session};

use crate::application::ports::{BastionReport, HostKeyProbe, ScanRequest};
use crate::domain::connection::Endpoint;
use crate::domain::play::shell_quote;

/// Default bound on connecting and on each blocking libssh2 call.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// `LIBSSH2_ERROR_TIMEOUT`
const LIBSSH2_ERROR_TIMEOUT: i32 = -9;

/// Production `HostKeyProbe`.
pub struct Ssh2Probe {
    connect_timeout: Duration,
}

impl Ssh2Probe {
    #[must_use]
    pub fn new(connect_timeout: Duration) -> Self {
        Self { connect_timeout }
    }
}

impl Default for Ssh2Probe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT)
    }
}

impl HostKeyProbe for Ssh2Probe {
    async fn fetch_host_key(&self, target: &Endpoint) -> Result<Option<String>> {
        let host = target.host.clone();
        let port = target.port;
        let timeout = self.connect_timeout;
        tokio::task::spawn_blocking(move || -> Result<Option<String>> {
            let tcp = connect(&host, port, timeout)?;
            match start_session(tcp, timeout) {
                Ok(session) => Ok(offered_key(&session)),
                Err(e) if is_timeout(&e) => {
                    Err(anyhow::Error::new(e).context(format!("SSH handshake with {host}:{port}")))
                }
                Err(e) => {
                    tracing::debug!(%host, port, error = %e, "transport answered but SSH handshake failed");
                    Ok(None)
                }
            }
        })
        .await
        .context("spawn_blocking for fetch_host_key")?
    }

    async fn open_bastion(
        &self,
        bastion: &Endpoint,
        key_file: Option<&Path>,
        scan: Option<&ScanRequest>,
    ) -> Result<BastionReport> {
        let bastion = bastion.clone();
        let key_file = key_file.map(Path::to_path_buf);
        let scan = scan.cloned();
        let timeout = self.connect_timeout;
        tokio::task::spawn_blocking(move || {
            bastion_session(&bastion, key_file.as_deref(), scan.as_ref(), timeout)
        })
        .await
        .context("spawn_blocking for open_bastion")?
    }
}

fn connect(host: &str, port: u16, timeout: Duration) -> Result<TcpStream> {
    let addr = (host, port)
        .to_socket_addrs()
        .with_context(|| format!("resolving {host}"))?
        .next()
        .ok_or_else(|| anyhow::anyhow!("no addresses found for {host}"))?;
    TcpStream::connect_timeout(&addr, timeout)
        .with_context(|| format!("connecting to {host}:{port}"))
}

/// Runs the SSH transport handshake, without authenticating. Every blocking
/// libssh2 call on the session is bounded by `timeout`.
fn start_session(tcp: TcpStream, timeout: Duration) -> Result<Session, ssh2::Error> {
    let mut session = Session::new()?;
    session.set_timeout(millis(timeout));
    session.set_tcp_stream(tcp);
    session.handshake()?;
    Ok(session)
}

fn handshake(host: &str, port: u16, timeout: Duration) -> Result<Session> {
    let tcp = connect(host, port, timeout)?;
    start_session(tcp, timeout).with_context(|| format!("SSH handshake with {host}:{port}"))
}

fn is_timeout(e: &ssh2::Error) -> bool {
    matches!(e.code(), ErrorCode::Session(LIBSSH2_ERROR_TIMEOUT))
}

/// libssh2 takes its timeout in milliseconds; zero would mean "wait forever".
fn millis(timeout: Duration) -> u32 {
    u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX).max(1)
}

/// `<type> <base64>` of the key the server offered, if it is of a known type.
fn offered_key(session: &Session) -> Option<String> {
    let (bytes, kind) = session.host_key()?;
    let name = key_type_name(kind)?;
    Some(format!("{name} {}", STANDARD.encode(bytes)))
}

/// OpenSSH name of a libssh2 host key type.
fn key_type_name(kind: HostKeyType) -> Option<&'static str> {
    match kind {
        HostKeyType::Rsa => Some("ssh-rsa"),
        HostKeyType::Dss => Some("ssh-dss"),
        HostKeyType::Ecdsa256 => Some("ecdsa-sha2-nistp256"),
        HostKeyType::Ecdsa384 => Some("ecdsa-sha2-nistp384"),
        HostKeyType::Ecdsa521 => Some("ecdsa-sha2-nistp521"),
        HostKeyType::Ed25519 => Some("ssh-ed25519"),
        _ => None,
    }
}

fn bastion_session(
    bastion: &Endpoint,
    key_file: Option<&Path>,
    scan: Option<&ScanRequest>,
    timeout: Duration,
) -> Result<BastionReport> {
    let session = handshake(&bastion.host, bastion.port, timeout)?;
    let host_key = offered_key(&session)
        .ok_or_else(|| anyhow::anyhow!("bastion offered no usable host key"))?;

    authenticate(&session, bastion, key_file)?;

    let scanned = match scan {
        Some(request) => {
            // The remote scan may legitimately run for its whole `-T`.
            session.set_timeout(millis(request.timeout.max(Duration::from_secs(1)) + timeout));
            Some(run_keyscan(&session, request)?)
        }
        None => None,
    };
    Ok(BastionReport { host_key, scanned })
}

/// The two login methods a bastion accepts.
trait UserAuth {
    /// `Ok(true)` once the session is authenticated.
    fn with_key(&self, user: &str, key_file: &Path) -> Result<bool>;
    fn with_password(&self, user: &str, password: &str) -> Result<bool>;
}

impl UserAuth for Session {
    fn with_key(&self, user: &str, key_file: &Path) -> Result<bool> {
        self.userauth_pubkey_file(user, None, key_file, None)?;
        Ok(self.authenticated())
    }

    fn with_password(&self, user: &str, password: &str) -> Result<bool> {
        self.userauth_password(user, password)?;
        Ok(self.authenticated())
    }
}

/// Key file first; the password is tried when there is no key or the key
/// is refused.
fn authenticate(auth: &impl UserAuth, bastion: &Endpoint, key_file: Option<&Path>) -> Result<()> {
    let mut failures = Vec::new();
    if let Some(path) = key_file {
        match auth.with_key(&bastion.user, path) {
            Ok(true) => return Ok(()),
            Ok(false) => failures.push("key refused".to_string()),
            Err(e) => failures.push(format!("key: {e:#}")),
        }
    }
    if !bastion.password.is_empty() {
        match auth.with_password(&bastion.user, &bastion.password) {
            Ok(true) => return Ok(()),
            Ok(false) => failures.push("password refused".to_string()),
            Err(e) => failures.push(format!("password: {e:#}")),
        }
    }
    if failures.is_empty() {
        anyhow::bail!("no private key or password for {}", bastion.display());
    }
    anyhow::bail!(
        "authentication as {} failed ({})",
        bastion.display(),
        failures.join("; ")
    )
}

fn keyscan_command(request: &ScanRequest) -> String {
    format!(
        "ssh-keyscan -T {} -p {} {}",
        request.timeout.as_secs().max(1),
        request.port,
        shell_quote(&request.host)
    )
}

fn run_keyscan(session: &Session, request: &ScanRequest) -> Result<String> {
    let command = keyscan_command(request);
    tracing::debug!(%command, "running on bastion");

    let mut channel = session.channel_session().context("opening bastion channel")?;
    channel.exec(&command).context("starting ssh-keyscan")?;
    let mut stdout = String::new();
    channel
        .read_to_string(&mut stdout)
        .context("reading ssh-keyscan output")?;
    channel.wait_close().context("closing bastion channel")?;
    let status = channel.exit_status()?;

    let lines = stdout.trim();
    anyhow::ensure!(
        !lines.is_empty(),
        "ssh-keyscan returned no keys (exit status {status})"
    );
    Ok(lines.to_string())
}
