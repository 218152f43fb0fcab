//! OS-level adapters for replayctl: port probes, signals, spawning and the
//! replayer supervisor.
#![deny(unsafe_code)]

pub mod assets;
mod command;
pub mod inspect;
pub mod kill;
pub mod output;
pub mod probe;
pub mod shutdown;
mod supervisor;

// Re-export the main ReplayerRunner implementation
pub use supervisor::{RELEASE_TIMEOUT, ReplayerSupervisor, SupervisorBuilder};

// Re-export command construction for callers that only want to inspect it
pub use command::{PRELOAD_VAR, build_launch_command, shell_quote, spawn_replayer};

// Re-export probe selection and port checks
pub use probe::{
    LsofProbe, ProcNetProbe, check_ports_available, default_probe, is_port_free,
};

pub use assets::{Staged, stage_all, stage_library, stage_static_assets};
pub use kill::{DEFAULT_KILL_SIGNAL, PortKill, kill_owner, stop_port_owner};
