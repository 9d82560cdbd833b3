//! Command-line argument definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// tunnelwatch - VPN service status monitor and control
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Override the config directory
    #[arg(long, env = "TUNNELWATCH_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// Monitor this service instead of the configured one
    #[arg(long, short, value_name = "NAME")]
    pub service: Option<String>,

    /// Subcommand to execute; defaults to `watch`
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the current connection status once
    Status {
        /// Emit the status as JSON
        #[arg(long)]
        json: bool,
    },
    /// Monitor continuously, printing every observed change
    Watch,
    /// Start the VPN service
    Connect,
    /// Stop the VPN service (watch mode keeps re-stopping auto-reconnects)
    Disconnect,
    /// List VPN services registered with the system
    Services,
    /// Persist which service to monitor
    Use {
        /// Service display name as shown by `services`
        name: String,
    },
}
