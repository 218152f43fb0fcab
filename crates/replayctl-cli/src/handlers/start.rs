//! Start and fast-start command handlers.
//!
//! The replayer lives as long as this process: the handler stays in the
//! foreground until the operator stops it or the replayer exits, and the
//! exit hooks stop it on the way out.

use std::time::Duration;

use replayctl_core::{ReplayerInfo, ReplayerRunner, StopReport};
use tokio::time::interval;
use tracing::{info, warn};

use crate::bootstrap::CliContext;
use crate::commands::LaunchArgs;
use crate::error::CliError;
use crate::signals::{ControlEvent, ControlSignals};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Which start flavour to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Check the ports first.
    Guarded,
    /// Skip the port check.
    Fast,
}

pub async fn execute(ctx: &CliContext, args: &LaunchArgs, mode: StartMode) -> Result<(), CliError> {
    ctx.settings.validate()?;

    let supervisor = ctx.supervisor();
    let options = ctx.launch_options(args);
    let mut signals = ControlSignals::install()?;

    let info = match mode {
        StartMode::Guarded => supervisor.start(options.clone()).await?,
        StartMode::Fast => supervisor.fast_start(options.clone()).await?,
    };
    announce(&info);
    if let Some(log_file) = options.log_file() {
        println!("Replayer trace log: {log_file}");
    }

    let mut ticker = interval(EXIT_POLL_INTERVAL);
    let outcome = loop {
        tokio::select! {
            event = signals.next() => match event {
                ControlEvent::Shutdown => {
                    info!("Shutdown requested");
                    break Ok(());
                }
                ControlEvent::Restart => {
                    info!("Restart requested");
                    match supervisor.fast_start(options.clone()).await {
                        Ok(info) => announce(&info),
                        Err(e) => break Err(CliError::from(e)),
                    }
                }
            },
            _ = ticker.tick() => {
                if let Some(status) = supervisor.exit_status().await {
                    if status.success() {
                        info!(%status, "Replayer exited");
                        break Ok(());
                    }
                    warn!(%status, "Replayer exited unexpectedly");
                    break Err(CliError::Process(format!("replayer exited with {status}")));
                }
            }
        }
    };

    ctx.hooks.run_all().await;
    // fast-start registers no hook.
    if let StopReport::Stopped { recovery, .. } = supervisor.stop().await {
        info!(?recovery, "Replayer stopped");
    }

    outcome
}

fn announce(info: &ReplayerInfo) {
    match info.pid {
        Some(pid) => println!("Replayer started (pid {pid}) on ports {}", info.ports),
        None => println!("Replayer started on ports {}", info.ports),
    }
}
