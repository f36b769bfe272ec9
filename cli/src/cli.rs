//! CLI argument parsing with clap derive

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;

/// Bootstrap SSH/WinRM host trust and apply Ansible plays from this machine
#[derive(Parser)]
#[command(
    name = "hostbridge",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Directory for temporary keys, known-hosts files and inventories
    #[arg(long, global = true, env = "HOSTBRIDGE_TMPDIR")]
    pub temp_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Apply every enabled play of a manifest
    Provision(commands::provision::ProvisionArgs),

    /// Print the inventories a run would generate
    Inventory(commands::inventory::InventoryArgs),

    /// Read a host's SSH key and print it as a known-hosts line
    Keyscan(commands::keyscan::KeyscanArgs),

    /// Show version
    Version {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli {
            quiet,
            no_color,
            temp_dir,
            command,
        } = self;
        let app = AppContext::new(&AppFlags {
            output: OutputFlags { no_color, quiet },
            temp_dir,
        });
        match command {
            Command::Provision(args) => commands::provision::run(&args, &app).await,
            Command::Inventory(args) => commands::inventory::run(&args),
            Command::Keyscan(args) => commands::keyscan::run(&args, &app).await,
            Command::Version { json } => {
                commands::version::run(json);
                Ok(())
            }
        }
    }
}
