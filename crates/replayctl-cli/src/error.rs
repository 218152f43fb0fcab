//! CLI-specific error types and mappings.
//!
//! Maps supervisor and path errors to exit codes and user-facing messages.

use replayctl_core::{PathError, SupervisorError};
use thiserror::Error;

/// CLI-specific error type.
#[derive(Debug, Error)]
pub enum CliError {
    /// Supervisor error that needs no special exit code.
    #[error("{0}")]
    Core(String),

    /// The replayer ports are taken.
    #[error("{0}")]
    Unavailable(String),

    /// A required asset is missing.
    #[error("{0}")]
    MissingInput(String),

    /// IO error (file not found, permission denied, etc.).
    #[error("IO error: {0}")]
    Io(String),

    /// Configuration error.
    #[error("{0}")]
    Config(String),

    /// Process execution error.
    #[error("Process error: {0}")]
    Process(String),
}

impl CliError {
    /// Map error to appropriate exit code.
    ///
    /// Exit codes follow Unix conventions:
    /// - 0: Success
    /// - 1: General error
    /// - 64-78: Specific error categories (see sysexits.h)
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::Core(_) => 1,
            Self::MissingInput(_) => 66, // EX_NOINPUT
            Self::Unavailable(_) => 69,  // EX_UNAVAILABLE
            Self::Process(_) => 71,      // EX_OSERR
            Self::Io(_) => 74,           // EX_IOERR
            Self::Config(_) => 78,       // EX_CONFIG
        }
    }
}

impl From<SupervisorError> for CliError {
    fn from(err: SupervisorError) -> Self {
        let message = err.to_string();
        match err {
            SupervisorError::PortsOccupied { .. } | SupervisorError::AmbiguousOwnership { .. } => {
                Self::Unavailable(message)
            }
            SupervisorError::AssetMissing { .. } => Self::MissingInput(message),
            SupervisorError::Configuration(_) => Self::Config(message),
            SupervisorError::SpawnFailed(_) | SupervisorError::ProbeFailed(_) => {
                Self::Process(message)
            }
            SupervisorError::NotRunning | SupervisorError::RecoveryKillFailed { .. } => {
                Self::Core(message)
            }
        }
    }
}

impl From<PathError> for CliError {
    fn from(err: PathError) -> Self {
        Self::Config(format!("Path error: {err}"))
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use replayctl_core::PortSet;

    #[test]
    fn guard_errors_map_to_unavailable() {
        let err: CliError = SupervisorError::PortsOccupied {
            ports: PortSet::new([7001, 7002]),
            pid: Some(555),
        }
        .into();
        assert_eq!(err.exit_code(), 69);
        assert!(err.to_string().contains("555"));

        let err: CliError = SupervisorError::AmbiguousOwnership { pids: vec![1, 2] }.into();
        assert_eq!(err.exit_code(), 69);
    }

    #[test]
    fn other_errors_keep_their_category() {
        let err: CliError = SupervisorError::asset_missing("/x/lib.so", "gone").into();
        assert_eq!(err.exit_code(), 66);
        let err: CliError = SupervisorError::Configuration("bad".into()).into();
        assert_eq!(err.exit_code(), 78);
        let err: CliError = SupervisorError::SpawnFailed("nope".into()).into();
        assert_eq!(err.exit_code(), 71);
        let err: CliError = PathError::EmptyPath.into();
        assert_eq!(err.exit_code(), 78);
    }
}
