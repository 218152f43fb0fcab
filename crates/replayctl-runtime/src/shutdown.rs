//! Handle termination for the spawned replayer with SIGTERM → SIGKILL escalation.

use std::io;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tracing::debug;

#[cfg(unix)]
use tokio::time::timeout;

#[cfg(unix)]
use nix::sys::signal::{self, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// How long the replayer gets to exit after SIGTERM.
pub const TERMINATE_GRACE: Duration = Duration::from_secs(5);

/// Terminate a child and reap it.
///
/// # Strategy
/// 1. Send SIGTERM and wait up to `grace` for the child to exit
/// 2. If still running, send SIGKILL
/// 3. Wait for reaping
///
/// A child that already exited is simply reaped. Without unix signals the
/// child is killed immediately.
pub async fn terminate_child(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Some(status) = child.try_wait()? {
        debug!(?status, "Replayer had already exited");
        return Ok(status);
    }

    #[cfg(unix)]
    {
        terminate_unix(child, grace).await
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        child.kill().await?;
        child.wait().await
    }
}

#[cfg(unix)]
async fn terminate_unix(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    let pid = child
        .id()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "child has no PID"))?;
    let raw = i32::try_from(pid).map_err(io::Error::other)?;

    if let Err(e) = signal::kill(Pid::from_raw(raw), Signal::SIGTERM) {
        if e == nix::errno::Errno::ESRCH {
            return child.wait().await;
        }
        return Err(io::Error::other(e));
    }

    if let Ok(result) = timeout(grace, child.wait()).await {
        return result;
    }

    debug!(pid, grace_ms = grace.as_millis(), "Replayer ignored SIGTERM, sending SIGKILL");
    child.kill().await?;
    child.wait().await
}
