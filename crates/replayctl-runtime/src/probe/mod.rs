//! Port owner probes and availability checks.

mod availability;
mod lsof;
mod proc_net;

pub use availability::{check_ports_available, is_port_free};
pub use lsof::LsofProbe;
pub use proc_net::ProcNetProbe;

use std::sync::Arc;

use replayctl_core::{PortOwnerProbe, SupervisorError};
use tracing::debug;

/// Pick the best probe for this host.
///
/// `/proc` is preferred where it exists; otherwise `lsof` must be on `PATH`.
pub fn default_probe() -> Result<Arc<dyn PortOwnerProbe>, SupervisorError> {
    let proc_net = ProcNetProbe::new();
    if proc_net.is_supported() {
        debug!("Using /proc port owner probe");
        return Ok(Arc::new(proc_net));
    }

    let lsof = LsofProbe::locate()?;
    debug!(binary = ?lsof, "Using lsof port owner probe");
    Ok(Arc::new(lsof))
}
