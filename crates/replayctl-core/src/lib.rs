//! Core domain types, ports and pure services for replayctl.
//!
//! This crate knows what supervising a replayer means (port sets, owner
//! resolution, launch options, exit hooks) but never touches a process.
//! OS adapters live in `replayctl-runtime`.

pub mod domain;
pub mod paths;
pub mod ports;
pub mod services;
pub mod settings;

// Re-export commonly used types for convenience
pub use domain::{
    KillOutcome, LaunchCommand, LaunchOptions, LaunchRequest, MatchStrategy, PlatformCapabilities,
    PortSet, Recovery, ReplayerInfo, ReplayerLogLevel, ResolvedPid, StopReport, SupervisorState,
    Verbosity,
};
pub use paths::{PathError, REPLAYER_LIBRARY_NAME, ResolvedPaths};
pub use ports::{PortOwnerProbe, ReplayerRunner, SupervisorError};
pub use services::{ExitHooks, build_launch_options, ensure_ports_unowned, resolve_owner};
pub use settings::{DEFAULT_INBOUND_PORT, DEFAULT_OUTBOUND_PORT, ReplayerSettings};
