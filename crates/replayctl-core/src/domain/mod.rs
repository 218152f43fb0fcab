//! Domain types for replayer supervision.
//!
//! Pure data with no OS access. Adapters in `replayctl-runtime` produce and
//! consume these values.

mod launch;
mod port_set;
mod process;

pub use launch::{
    DEBUGGER_TIMEOUT, ENV_DEBUGGER, ENV_GC_GLOBAL_STATUS_TIMEOUT, ENV_INBOUND_PORT,
    ENV_INBOUND_READ_TIMEOUT, ENV_LOG_FILE, ENV_LOG_LEVEL, ENV_MATCH_STRATEGY, ENV_OUTBOUND_PORT,
    ENV_PREFIX, ENV_TRACE, LaunchCommand, LaunchOptions, LaunchRequest, MatchStrategy,
    ReplayerLogLevel, Verbosity,
};
pub use port_set::PortSet;
pub use process::{
    KillOutcome, PlatformCapabilities, Recovery, ReplayerInfo, ResolvedPid, StopReport,
    SupervisorState,
};
