//! Main CLI parser and top-level argument handling.
//!
//! Global options override values from the environment and `.env`.

use std::path::PathBuf;

use clap::{ArgAction, Parser};
use replayctl_core::Verbosity;
use replayctl_core::paths::DATA_DIR_ENV;

use crate::commands::Commands;

/// Supervise the traffic replayer.
#[derive(Debug, Parser)]
#[command(name = "replayctl")]
#[command(about = "Start, stop and inspect the traffic replayer")]
#[command(version)]
pub struct Cli {
    /// Increase output verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short = 'q', long = "quiet", global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Override the data directory for this invocation
    #[arg(long = "data-dir", env = DATA_DIR_ENV, global = true)]
    pub data_dir: Option<String>,

    /// Port the replayer accepts inbound traffic on
    #[arg(long = "inbound-port", global = true)]
    pub inbound_port: Option<u16>,

    /// Port the replayer serves outbound mocks on
    #[arg(long = "outbound-port", global = true)]
    pub outbound_port: Option<u16>,

    /// Command running the application under replay
    #[arg(long = "server-command", global = true)]
    pub server_command: Option<String>,

    /// Replayer library to preload into the server command
    #[arg(long = "library", global = true)]
    pub library: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    pub const fn verbosity(&self) -> Verbosity {
        Verbosity::from_flags(self.quiet, self.verbose)
    }
}
