//! Command-line argument definitions for boxharness.

use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};

/// Command-line interface for boxharness.
#[derive(Debug, Parser)]
#[command(name = "boxharness")]
#[command(
    author,
    version,
    about = "Behaviour-driven scenarios against a cloud file-storage API"
)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file.
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Session token for the storage API.
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Base URL for storage API metadata operations.
    #[arg(long, global = true)]
    pub api_base_url: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    pub log_json: bool,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run feature files against the configured storage API.
    Run(RunArgs),

    /// List the registered step phrases in match order.
    Steps,

    /// Force-delete a leaked scenario container.
    Purge(PurgeArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Debug, Parser)]
pub struct RunArgs {
    /// Feature files to run.
    #[arg(required = true)]
    pub features: Vec<Utf8PathBuf>,
}

/// Arguments for the `purge` subcommand.
#[derive(Debug, Parser)]
pub struct PurgeArgs {
    /// Identifier of the remote folder to delete.
    #[arg(required = true)]
    pub folder_id: String,
}
