//! Port availability checks.

use std::net::{Ipv4Addr, SocketAddr, TcpStream};
use std::time::Duration;

use replayctl_core::{PortSet, SupervisorError};
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(200);

/// Check whether nothing accepts connections on `127.0.0.1:<port>`.
///
/// A refused or timed-out connection counts as free.
pub fn is_port_free(port: u16) -> bool {
    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
    match TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT) {
        Ok(_) => false,
        Err(e) => {
            debug!(port, error = %e, "Port is free");
            true
        }
    }
}

/// Fail with `PortsOccupied` if any port in the set accepts connections.
///
/// Catches listeners the owner probe cannot see (other users' processes,
/// containers).
pub fn check_ports_available(ports: &PortSet) -> Result<(), SupervisorError> {
    let busy: Vec<u16> = ports.iter().filter(|port| !is_port_free(*port)).collect();
    if busy.is_empty() {
        Ok(())
    } else {
        Err(SupervisorError::PortsOccupied {
            ports: PortSet::new(busy),
            pid: None,
        })
    }
}
