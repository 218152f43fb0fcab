//! Port definitions (traits) and the supervisor error taxonomy.
//!
//! Ports describe what the core needs from the OS without naming how it is
//! done. `replayctl-runtime` provides the implementations.

mod port_probe;
mod replayer_runner;

pub use port_probe::PortOwnerProbe;
pub use replayer_runner::ReplayerRunner;

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::PortSet;

/// Errors raised while supervising the replayer.
///
/// Guard-phase errors (`PortsOccupied`, `AmbiguousOwnership`, `AssetMissing`)
/// abort the operation that triggered them. `NotRunning` and
/// `RecoveryKillFailed` only ever reach the log.
#[derive(Debug, Error)]
pub enum SupervisorError {
    /// Something already listens on the replayer's ports.
    #[error("{}", occupied_message(ports, *pid))]
    PortsOccupied { ports: PortSet, pid: Option<u32> },

    /// The ports are held by more than one process.
    #[error(
        "Replayer ports are held by several processes ({}); refusing to guess which one to kill",
        join_pids(pids)
    )]
    AmbiguousOwnership { pids: Vec<u32> },

    /// A companion library or static asset is missing and could not be staged.
    #[error("Required asset missing at {path}: {reason}")]
    AssetMissing { path: PathBuf, reason: String },

    /// `stop` was called without a tracked process.
    #[error("Replayer is not running")]
    NotRunning,

    /// The fallback kill against the real port owner was rejected.
    #[error("Failed to kill replayer port owner {pid}: {reason}")]
    RecoveryKillFailed { pid: u32, reason: String },

    /// The OS refused to spawn the replayer.
    #[error("Failed to spawn replayer: {0}")]
    SpawnFailed(String),

    /// The port-owner query itself could not run.
    #[error("Port owner query failed: {0}")]
    ProbeFailed(String),

    /// Invalid or incomplete configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SupervisorError {
    pub fn asset_missing(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::AssetMissing {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

fn occupied_message(ports: &PortSet, pid: Option<u32>) -> String {
    match pid {
        Some(pid) => format!("Ports {ports} are already in use by pid {pid}"),
        None => format!("Ports {ports} are already in use"),
    }
}

fn join_pids(pids: &[u32]) -> String {
    pids.iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
