//! Status command handler.

use replayctl_core::ResolvedPid;
use replayctl_runtime::inspect::owner_process_name;
use serde_json::json;

use crate::bootstrap::CliContext;
use crate::error::CliError;

pub fn execute(ctx: &CliContext, as_json: bool) -> Result<(), CliError> {
    let ports = ctx.settings.port_set();
    let owner = replayctl_core::resolve_owner(ctx.probe.as_ref(), &ports)?;
    let name = owner.pid().and_then(owner_process_name);

    if as_json {
        let value = json!({
            "ports": ports,
            "owner": owner,
            "process": name,
        });
        let text = serde_json::to_string_pretty(&value)
            .map_err(|e| CliError::Core(format!("failed to encode status: {e}")))?;
        println!("{text}");
        return Ok(());
    }

    match owner {
        ResolvedPid::NoOwner => println!("Replayer is not running (ports {ports} are free)"),
        ResolvedPid::Single(pid) => match name {
            Some(name) => println!("Replayer is running: pid {pid} ({name}) on ports {ports}"),
            None => println!("Replayer is running: pid {pid} on ports {ports}"),
        },
    }
    Ok(())
}
