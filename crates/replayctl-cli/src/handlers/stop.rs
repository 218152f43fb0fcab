//! Stop command handler.
//!
//! Stops a replayer started by another invocation: there is no process
//! handle here, only the ports.

use replayctl_core::KillOutcome;
use replayctl_runtime::inspect::describe_pid;
use replayctl_runtime::stop_port_owner;

use crate::bootstrap::CliContext;
use crate::error::CliError;

/// Signal whatever owns the replayer ports.
///
/// Returns the kill outcome; `NotFound` means nothing was running, which is
/// the state the operator asked for.
pub fn execute(ctx: &CliContext, signal: i32) -> Result<KillOutcome, CliError> {
    let ports = ctx.settings.port_set();
    let described = |pid: Option<u32>| pid.map_or_else(|| "?".to_string(), describe_pid);

    let kill = stop_port_owner(ctx.probe.as_ref(), &ports, signal)?;
    match kill.outcome {
        KillOutcome::NotFound => match kill.pid {
            None => println!("No replayer running on ports {ports}"),
            Some(pid) => println!("Replayer {pid} exited before it could be stopped"),
        },
        KillOutcome::Killed => println!("Stopped replayer {} (signal {signal})", described(kill.pid)),
        KillOutcome::Failed => eprintln!(
            "Failed to stop replayer {} on ports {ports}; manual intervention may be needed",
            described(kill.pid)
        ),
    }
    Ok(kill.outcome)
}
