//! Launch command construction and replayer spawning.

use std::path::Path;
use std::process::Stdio;

use replayctl_core::{LaunchCommand, LaunchOptions, ReplayerSettings, SupervisorError};
use tokio::process::{Child, Command};
use tracing::debug;

/// Variable the dynamic loader reads to inject the replayer library.
#[cfg(target_os = "macos")]
pub const PRELOAD_VAR: &str = "DYLD_INSERT_LIBRARIES";

/// Variable the dynamic loader reads to inject the replayer library.
#[cfg(not(target_os = "macos"))]
pub const PRELOAD_VAR: &str = "LD_PRELOAD";

/// Build the shell command line and environment for the replayer.
///
/// The preload assignment is part of the command line rather than the spawn
/// environment so that only the server command is injected, not the shell.
/// This is what makes the spawn API report the shell's PID instead of the
/// listener's on Linux.
pub fn build_launch_command(
    options: &LaunchOptions,
    settings: &ReplayerSettings,
) -> Result<LaunchCommand, SupervisorError> {
    let server_command = settings.require_server_command()?;

    let command = match &settings.library_path {
        Some(library) => format!("{PRELOAD_VAR}={} {server_command}", shell_quote(library)),
        None => server_command.to_string(),
    };

    Ok(options
        .iter()
        .fold(LaunchCommand::new(command), |cmd, (key, value)| {
            cmd.with_env(key, value)
        }))
}

/// Quote a path for `sh`, keeping plain paths readable.
pub fn shell_quote(path: &Path) -> String {
    let raw = path.to_string_lossy();
    let plain = !raw.is_empty()
        && raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '_' | '-' | '+' | ':'));
    if plain {
        raw.into_owned()
    } else {
        format!("'{}'", raw.replace('\'', r"'\''"))
    }
}

/// Spawn the replayer through `sh -c` with piped output.
///
/// The child is killed if its handle is dropped.
pub fn spawn_replayer(command: &LaunchCommand) -> Result<Child, SupervisorError> {
    let mut cmd = Command::new("sh");
    cmd.arg("-c")
        .arg(&command.command)
        .envs(&command.env)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let child = cmd
        .spawn()
        .map_err(|e| SupervisorError::SpawnFailed(format!("sh -c '{}': {e}", command.command)))?;

    debug!(pid = ?child.id(), command = %command.command, "Spawned replayer");
    Ok(child)
}
