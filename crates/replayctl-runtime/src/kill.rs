//! Signal delivery by PID, for processes we hold no `Child` handle for.
//!
//! Used by the port-based recovery in `stop` and by `replayctl stop`, where
//! the replayer was started by another invocation.

use std::time::Duration;

use replayctl_core::{KillOutcome, PortOwnerProbe, PortSet, ResolvedPid, SupervisorError, resolve_owner};
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// SIGKILL. The recovery path uses the strongest signal there is.
pub const DEFAULT_KILL_SIGNAL: i32 = 9;

const RELEASE_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Result of a port-based kill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortKill {
    /// Owner the signal was aimed at, if there was one.
    pub pid: Option<u32>,
    pub outcome: KillOutcome,
}

/// Deliver `signal` to `pid`.
///
/// Returns `NotFound` when there is no such process, `Killed` when the
/// signal was accepted and `Failed` when it was rejected (permissions, bad
/// signal number). PID 0 would address our own process group and is
/// reported as `NotFound`.
pub fn kill_owner(pid: u32, signal: i32) -> KillOutcome {
    if pid == 0 {
        return KillOutcome::NotFound;
    }

    #[cfg(unix)]
    {
        kill_owner_unix(pid, signal)
    }

    #[cfg(not(unix))]
    {
        let _ = signal;
        warn!(pid, "Killing by PID is not supported on this platform");
        KillOutcome::Failed
    }
}

#[cfg(unix)]
fn kill_owner_unix(pid: u32, signal: i32) -> KillOutcome {
    let Ok(raw) = i32::try_from(pid) else {
        return KillOutcome::NotFound;
    };
    let signal = match Signal::try_from(signal) {
        Ok(signal) => signal,
        Err(e) => {
            warn!(pid, signal, error = %e, "Refusing to send invalid signal");
            return KillOutcome::Failed;
        }
    };

    let outcome = classify_kill(signal::kill(Pid::from_raw(raw), signal));
    debug!(pid, %signal, ?outcome, "Signal delivered");
    outcome
}

/// Map the result of `kill(2)` to the three-valued kill contract.
#[cfg(unix)]
pub fn classify_kill(result: nix::Result<()>) -> KillOutcome {
    match result {
        Ok(()) => KillOutcome::Killed,
        Err(Errno::ESRCH) => KillOutcome::NotFound,
        Err(_) => KillOutcome::Failed,
    }
}

/// Resolve the PortSet owner and signal it.
///
/// No owner is `NotFound`; ambiguous ownership is returned as an error
/// without signalling anything.
pub fn stop_port_owner(
    probe: &dyn PortOwnerProbe,
    ports: &PortSet,
    signal: i32,
) -> Result<PortKill, SupervisorError> {
    match resolve_owner(probe, ports)? {
        ResolvedPid::NoOwner => {
            debug!(%ports, "No process owns the replayer ports");
            Ok(PortKill {
                pid: None,
                outcome: KillOutcome::NotFound,
            })
        }
        ResolvedPid::Single(pid) => {
            info!(pid, %ports, signal, "Killing replayer port owner");
            Ok(PortKill {
                pid: Some(pid),
                outcome: kill_owner(pid, signal),
            })
        }
    }
}

/// Poll the probe until nothing owns the ports or `timeout` elapses.
///
/// Returns `true` once the ports are released. Probe errors count as "not
/// yet released".
pub async fn wait_ports_released(
    probe: &dyn PortOwnerProbe,
    ports: &PortSet,
    timeout: Duration,
) -> bool {
    let deadline = Instant::now() + timeout;
    loop {
        match resolve_owner(probe, ports) {
            Ok(ResolvedPid::NoOwner) => return true,
            Ok(ResolvedPid::Single(pid)) => debug!(pid, %ports, "Ports still owned"),
            Err(e) => debug!(error = %e, "Port release check failed"),
        }
        if Instant::now() >= deadline {
            return false;
        }
        sleep(RELEASE_POLL_INTERVAL).await;
    }
}
