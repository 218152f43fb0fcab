//! Port-PID resolution: which single process owns the replayer's ports.

use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::domain::{PortSet, ResolvedPid};
use crate::ports::{PortOwnerProbe, SupervisorError};

/// Find the one process listening on the given ports.
///
/// Every port is queried fresh. Zero owners gives [`ResolvedPid::NoOwner`],
/// one distinct PID across all ports gives [`ResolvedPid::Single`], and two or
/// more distinct PIDs fail with [`SupervisorError::AmbiguousOwnership`]. No
/// PID is ever picked heuristically.
pub fn resolve_owner(
    probe: &dyn PortOwnerProbe,
    ports: &PortSet,
) -> Result<ResolvedPid, SupervisorError> {
    let mut owners = BTreeSet::new();

    for port in ports.iter() {
        let pids = probe.listeners(port)?;
        trace!(port = %port, ?pids, "Port owner query");
        owners.extend(pids);
    }

    let mut iter = owners.iter().copied();
    match (iter.next(), iter.next()) {
        (None, _) => Ok(ResolvedPid::NoOwner),
        (Some(pid), None) => Ok(ResolvedPid::Single(pid)),
        (Some(_), Some(_)) => {
            let pids: Vec<u32> = owners.into_iter().collect();
            debug!(%ports, ?pids, "Replayer ports resolve to several owners");
            Err(SupervisorError::AmbiguousOwnership { pids })
        }
    }
}

/// Pre-start guard: fail unless nobody owns any of the ports.
///
/// A single owner becomes [`SupervisorError::PortsOccupied`]; ambiguity is
/// passed through unchanged.
pub fn ensure_ports_unowned(
    probe: &dyn PortOwnerProbe,
    ports: &PortSet,
) -> Result<(), SupervisorError> {
    match resolve_owner(probe, ports)? {
        ResolvedPid::NoOwner => Ok(()),
        ResolvedPid::Single(pid) => Err(SupervisorError::PortsOccupied {
            ports: ports.clone(),
            pid: Some(pid),
        }),
    }
}
