//! Process-level domain types shared by the supervisor and its adapters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::PortSet;

/// Lifecycle state of the supervised replayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SupervisorState {
    /// No live process handle.
    Idle,
    /// A spawned process is tracked and has not exited.
    Running,
}

impl fmt::Display for SupervisorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running => f.write_str("running"),
        }
    }
}

/// Owner of a [`PortSet`] as seen by the OS right now.
///
/// Ambiguous ownership is not a variant: it is reported as
/// [`SupervisorError::AmbiguousOwnership`](crate::SupervisorError::AmbiguousOwnership)
/// so callers cannot accidentally act on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "owner", content = "pid", rename_all = "snake_case")]
pub enum ResolvedPid {
    /// Nothing listens on any port of the set.
    NoOwner,
    /// Exactly one process listens on one or more ports of the set.
    Single(u32),
}

impl ResolvedPid {
    pub const fn pid(self) -> Option<u32> {
        match self {
            Self::NoOwner => None,
            Self::Single(pid) => Some(pid),
        }
    }
}

/// Result of delivering a signal to a port owner.
///
/// Carries the classic three-value contract through [`KillOutcome::code`]:
/// `-1` no process, `0` delivered, `1` rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KillOutcome {
    /// No such process; the ports are already in the desired state.
    NotFound,
    /// The signal was delivered.
    Killed,
    /// The OS refused the signal (permissions, protected process).
    Failed,
}

impl KillOutcome {
    pub const fn code(self) -> i32 {
        match self {
            Self::NotFound => -1,
            Self::Killed => 0,
            Self::Failed => 1,
        }
    }

    /// Whether the ports can be considered free after this outcome.
    pub const fn is_clean(self) -> bool {
        !matches!(self, Self::Failed)
    }
}

/// Host platform behaviour that changes how `stop` must verify itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformCapabilities {
    /// The spawn API reports a PID that is not the listening process
    /// (preload injected through the shell command line), so after
    /// terminating the handle the ports must be checked and their owner
    /// killed directly.
    pub needs_port_based_recovery: bool,
}

impl PlatformCapabilities {
    /// Resolve capabilities for the host this binary was built for.
    pub const fn detect() -> Self {
        Self {
            needs_port_based_recovery: cfg!(target_os = "linux"),
        }
    }

    pub const fn with_port_based_recovery(mut self, enabled: bool) -> Self {
        self.needs_port_based_recovery = enabled;
        self
    }
}

impl Default for PlatformCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}

/// Snapshot of the tracked replayer process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplayerInfo {
    /// PID reported by the spawn API (may be the wrapping shell).
    pub pid: Option<u32>,
    /// Command line handed to the shell.
    pub command: String,
    /// Ports the replayer is expected to bind.
    pub ports: PortSet,
    /// When the process was spawned.
    pub started_at: DateTime<Utc>,
}

/// What the post-terminate recovery check found and did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// Platform does not need port-based recovery.
    Skipped,
    /// No process owns the ports any more.
    PortsClean,
    /// A surviving owner was signalled.
    Killed { pid: u32 },
    /// The owner vanished before the signal landed.
    AlreadyGone { pid: u32 },
    /// Recovery could not complete; carries the reason for the operator.
    Failed(String),
}

/// Outcome of [`stop`](crate::ports::ReplayerRunner::stop).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReport {
    /// There was no handle to stop.
    NotRunning,
    /// The handle was terminated.
    Stopped {
        /// PID reported by the spawn API.
        pid: Option<u32>,
        recovery: Recovery,
    },
}

impl StopReport {
    pub const fn was_running(&self) -> bool {
        matches!(self, Self::Stopped { .. })
    }

    /// Whether operator attention is needed after this stop.
    pub const fn needs_attention(&self) -> bool {
        matches!(
            self,
            Self::Stopped {
                recovery: Recovery::Failed(_),
                ..
            }
        )
    }
}
