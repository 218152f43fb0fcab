//! Builds the replayer environment from operator intent and settings.

use std::path::Path;

use crate::domain::{
    DEBUGGER_TIMEOUT, ENV_DEBUGGER, ENV_GC_GLOBAL_STATUS_TIMEOUT, ENV_INBOUND_PORT,
    ENV_INBOUND_READ_TIMEOUT, ENV_LOG_FILE, ENV_LOG_LEVEL, ENV_MATCH_STRATEGY, ENV_OUTBOUND_PORT,
    ENV_TRACE, LaunchOptions, LaunchRequest,
};
use crate::settings::ReplayerSettings;

/// Build the replayer's launch options.
///
/// Configured timeouts are passed through. With a debugger attached, any
/// timeout left unconfigured becomes [`DEBUGGER_TIMEOUT`]. Trace verbosity
/// routes the replayer log to `log_file`.
pub fn build_launch_options(
    request: &LaunchRequest,
    settings: &ReplayerSettings,
    log_file: &Path,
) -> LaunchOptions {
    let mut options = LaunchOptions::new()
        .with(ENV_MATCH_STRATEGY, request.match_strategy.as_str())
        .with(ENV_INBOUND_PORT, settings.inbound_port.to_string())
        .with(ENV_OUTBOUND_PORT, settings.outbound_port.to_string());

    if request.trace {
        options = options.with(ENV_TRACE, "1");
    }
    if request.attach_debugger {
        options = options.with(ENV_DEBUGGER, "1");
    }

    let timeouts = [
        (
            ENV_INBOUND_READ_TIMEOUT,
            settings.inbound_read_timeout.as_deref(),
        ),
        (
            ENV_GC_GLOBAL_STATUS_TIMEOUT,
            settings.gc_global_status_timeout.as_deref(),
        ),
    ];
    for (key, configured) in timeouts {
        let value = match configured {
            Some(value) => Some(value),
            None if request.attach_debugger => Some(DEBUGGER_TIMEOUT),
            None => None,
        };
        if let Some(value) = value {
            options = options.with(key, value);
        }
    }

    let level = request.verbosity.replayer_log_level();
    options = options.with(ENV_LOG_LEVEL, level.as_str());
    if level.writes_to_file() {
        options = options.with(ENV_LOG_FILE, log_file.to_string_lossy());
    }

    options
}
