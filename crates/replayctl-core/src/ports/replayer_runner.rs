//! Replayer runner trait definition.
//!
//! This port defines the lifecycle interface the rest of the program uses to
//! drive the replayer. The runtime crate implements it with real processes.

use async_trait::async_trait;

use super::SupervisorError;
use crate::domain::{LaunchOptions, ReplayerInfo, StopReport, SupervisorState};

/// Lifecycle control for a single replayer process.
///
/// # Design Rules
///
/// - One replayer at a time; calls are expected to be sequential
/// - `stop` never fails, so it is safe from exit hooks
/// - `fast_start` never runs the pre-start port guard
#[async_trait]
pub trait ReplayerRunner: Send + Sync {
    /// Stage assets, verify the ports are free, then spawn.
    async fn start(&self, options: LaunchOptions) -> Result<ReplayerInfo, SupervisorError>;

    /// Spawn without the port guard, stopping any live process first.
    async fn fast_start(&self, options: LaunchOptions) -> Result<ReplayerInfo, SupervisorError>;

    /// Terminate the tracked process and make sure its ports are released.
    async fn stop(&self) -> StopReport;

    /// Current lifecycle state.
    async fn state(&self) -> SupervisorState;
}
