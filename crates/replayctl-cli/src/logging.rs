//! Tracing setup for the CLI.

use replayctl_core::Verbosity;
use tracing_subscriber::EnvFilter;

/// Install the global subscriber, writing to stderr.
///
/// `RUST_LOG` wins; otherwise the level follows `-q` / `-v`.
pub fn init_tracing(verbosity: Verbosity) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_directive()));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(verbosity >= Verbosity::VeryVerbose)
        .with_writer(std::io::stderr)
        .try_init();
}
