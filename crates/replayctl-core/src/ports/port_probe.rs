//! Port-owner probe trait definition.

use super::SupervisorError;

/// Queries the OS for processes listening on a TCP port.
///
/// Calls are synchronous and must hit the OS every time: the whole point is
/// to observe process state changes, so implementations never cache.
pub trait PortOwnerProbe: Send + Sync {
    /// PIDs currently holding `port` in LISTEN state.
    ///
    /// An empty vector means nobody listens. Output the probe cannot parse
    /// for this port counts as "no owner" (the owner may have exited between
    /// ports); only a probe that cannot run at all returns an error.
    fn listeners(&self, port: u16) -> Result<Vec<u32>, SupervisorError>;
}
