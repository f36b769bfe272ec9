//! `hostbridge keyscan` — read a host key the way a provisioning run would.

use std::time::Duration;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::trust::discover_direct;
use crate::domain::config::DEFAULT_KEYSCAN_TIMEOUT_SECS;
use crate::domain::connection::{DEFAULT_SSH_PORT, DEFAULT_SSH_USER, Endpoint, Secret};

/// Arguments for the keyscan command.
#[derive(Args)]
pub struct KeyscanArgs {
    /// Host name or address to read the key from
    pub host: String,

    /// SSH port
    #[arg(long, short, default_value_t = DEFAULT_SSH_PORT)]
    pub port: u16,

    /// Give up after this many seconds of retrying
    #[arg(long, default_value_t = DEFAULT_KEYSCAN_TIMEOUT_SECS)]
    pub timeout: u64,
}

/// Run `hostbridge keyscan` and print the known-hosts line on stdout.
///
/// # Errors
///
/// Returns a timeout-class error if no key is received within `--timeout`.
pub async fn run(args: &KeyscanArgs, app: &AppContext) -> Result<()> {
    let target = Endpoint {
        host: args.host.clone(),
        port: args.port,
        user: DEFAULT_SSH_USER.to_string(),
        password: Secret::default(),
        private_key: Secret::default(),
        host_key: String::new(),
    };
    let line = discover_direct(
        &app.probe,
        &app.sleeper,
        &app.terminal_reporter(),
        &target,
        Duration::from_secs(args.timeout),
    )
    .await?;
    println!("{line}");
    Ok(())
}
