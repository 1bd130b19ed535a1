//! Command-line interface definitions.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::remote::ImageKind;

/// A configuration synchronization and page reconciliation engine.
#[derive(Parser, Debug)]
#[command(name = "portfolio-sync", version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the configuration server.
    #[arg(
        long,
        default_value = "http://localhost:3001",
        env = "CONFIG_URL",
        global = true
    )]
    pub config_url: String,

    /// Redis URL for backup snapshots. Omitted, snapshots stay in memory.
    #[arg(long, env = "REDIS_URL", global = true)]
    pub redis_url: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Returns the log level based on verbosity flags.
    pub fn log_level(&self) -> &'static str {
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}

/// Available subcommands for the synchronization engine.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the reconciliation loop against a page tree.
    Run(RunArgs),

    /// Project the current configuration onto a page tree once.
    Project(ProjectArgs),

    /// Validate a configuration document without applying it.
    #[command(name = "config-validate")]
    ConfigValidate {
        /// Local document to validate; the published one when omitted.
        file: Option<PathBuf>,
    },

    /// Display the currently resolvable configuration.
    #[command(name = "config-show")]
    ConfigShow,

    /// Publish a local configuration document to the server.
    #[command(name = "config-push")]
    ConfigPush {
        /// Document to publish.
        file: PathBuf,
    },

    /// Upload an image into one of the server's slots.
    Upload {
        /// Destination slot: homepage, artist, logo or portfolio.
        kind: ImageKind,

        /// Image file to upload.
        file: PathBuf,
    },

    /// Check the configuration server's health.
    Health,
}

/// Arguments for the run subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// JSON page tree to reconcile.
    #[arg(long, default_value = "page.json")]
    pub tree: PathBuf,

    /// Local configuration file to watch; edits are published and
    /// re-applied automatically.
    #[arg(long)]
    pub watch_config: Option<PathBuf>,

    /// Treat the page as served from a nested directory.
    #[arg(long, default_value = "false")]
    pub nested: bool,

    /// Fallback re-projection interval in milliseconds.
    #[arg(long, default_value = "2000")]
    pub retry_interval_ms: u64,

    /// Attempt budget: tree-changing passes allowed before giving up.
    #[arg(long, default_value = "10")]
    pub max_attempts: u32,

    /// Prometheus metrics port.
    #[arg(long, default_value = "9090")]
    pub metrics_port: u16,

    /// Disable the Prometheus metrics server.
    #[arg(long, default_value = "false")]
    pub disable_metrics: bool,
}

/// Arguments for the project subcommand.
#[derive(Args, Debug)]
pub struct ProjectArgs {
    /// JSON page tree to project onto.
    #[arg(long, default_value = "page.json")]
    pub tree: PathBuf,

    /// Where to write the projected tree; stdout when omitted.
    #[arg(long)]
    pub out: Option<PathBuf>,

    /// Treat the page as served from a nested directory.
    #[arg(long, default_value = "false")]
    pub nested: bool,
}
