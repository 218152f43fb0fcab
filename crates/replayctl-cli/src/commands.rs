//! Main commands enum and launch arguments.

use clap::{Args, Subcommand};
use replayctl_core::{LaunchRequest, MatchStrategy, Verbosity};
use replayctl_runtime::DEFAULT_KILL_SIGNAL;

/// Available replayctl commands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Start the replayer after checking its ports are free, and keep it
    /// running until interrupted
    Start(LaunchArgs),

    /// Start (or restart) the replayer without the port check
    FastStart(LaunchArgs),

    /// Stop whatever replayer owns the configured ports
    Stop {
        /// Signal number to send to the port owner
        #[arg(long, default_value_t = DEFAULT_KILL_SIGNAL)]
        signal: i32,
    },

    /// Show which process owns the replayer ports
    Status {
        /// Print machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Copy the replayer library and report assets into place
    Stage,

    /// Show resolved paths for all replayctl directories
    Paths,
}

/// Options shared by `start` and `fast-start`.
#[derive(Debug, Clone, Default, Args)]
pub struct LaunchArgs {
    /// Matching strategy (sim or chunk)
    #[arg(long = "match-strategy", default_value_t = MatchStrategy::Sim)]
    pub match_strategy: MatchStrategy,

    /// Enable replayer request tracing
    #[arg(long)]
    pub trace: bool,

    /// Keep the replayer alive for a debugger session
    #[arg(long = "xdebug")]
    pub xdebug: bool,
}

impl LaunchArgs {
    pub fn to_request(&self, verbosity: Verbosity) -> LaunchRequest {
        LaunchRequest::new(self.match_strategy)
            .with_trace(self.trace)
            .with_debugger(self.xdebug)
            .with_verbosity(verbosity)
    }
}
