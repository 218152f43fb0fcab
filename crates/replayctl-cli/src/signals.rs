//! Operator signals while `start` runs in the foreground.

use std::io;

#[cfg(unix)]
use tokio::signal::unix::{Signal, SignalKind, signal};

/// What the operator asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Ctrl-C or SIGTERM: stop the replayer and exit.
    Shutdown,
    /// SIGHUP: restart the replayer with the cached command.
    Restart,
}

/// Listens for Ctrl-C, SIGTERM and SIGHUP.
pub struct ControlSignals {
    #[cfg(unix)]
    terminate: Signal,
    #[cfg(unix)]
    hangup: Signal,
}

impl ControlSignals {
    pub fn install() -> io::Result<Self> {
        Ok(Self {
            #[cfg(unix)]
            terminate: signal(SignalKind::terminate())?,
            #[cfg(unix)]
            hangup: signal(SignalKind::hangup())?,
        })
    }

    /// Wait for the next operator signal.
    pub async fn next(&mut self) -> ControlEvent {
        #[cfg(unix)]
        {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => ControlEvent::Shutdown,
                _ = self.terminate.recv() => ControlEvent::Shutdown,
                _ = self.hangup.recv() => ControlEvent::Restart,
            }
        }

        #[cfg(not(unix))]
        {
            let _ = tokio::signal::ctrl_c().await;
            ControlEvent::Shutdown
        }
    }
}
