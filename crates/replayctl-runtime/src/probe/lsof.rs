//! Port owner lookup through `lsof`.

use std::path::PathBuf;
use std::process::Command;

use replayctl_core::{PortOwnerProbe, SupervisorError};
use tracing::{debug, warn};

/// Resolves port owners by asking `lsof` for TCP listeners.
#[derive(Debug, Clone)]
pub struct LsofProbe {
    binary: PathBuf,
}

impl LsofProbe {
    /// Locate `lsof` on `PATH`.
    pub fn locate() -> Result<Self, SupervisorError> {
        which::which("lsof")
            .map(Self::with_binary)
            .map_err(|e| SupervisorError::ProbeFailed(format!("lsof not found: {e}")))
    }

    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl PortOwnerProbe for LsofProbe {
    fn listeners(&self, port: u16) -> Result<Vec<u32>, SupervisorError> {
        let output = Command::new(&self.binary)
            .args(["-nP", "-t", &format!("-iTCP:{port}"), "-sTCP:LISTEN"])
            .output()
            .map_err(|e| {
                SupervisorError::ProbeFailed(format!("failed to run {}: {e}", self.binary.display()))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);

        // lsof exits 1 when nothing matched.
        if !output.status.success() && stdout.trim().is_empty() {
            debug!(port, "lsof found no listener");
            return Ok(Vec::new());
        }

        Ok(parse_pid_lines(&stdout, port))
    }
}

/// Parse `lsof -t` output (one pid per line).
///
/// Anything that is not a pid makes the whole answer unusable; it is then
/// reported as "no owner" rather than guessed at.
fn parse_pid_lines(stdout: &str, port: u16) -> Vec<u32> {
    let mut pids = Vec::new();
    for line in stdout.lines().map(str::trim).filter(|l| !l.is_empty()) {
        match line.parse::<u32>() {
            Ok(pid) if !pids.contains(&pid) => pids.push(pid),
            Ok(_) => {}
            Err(_) => {
                warn!(port, line, "Unexpected lsof output, treating port as unowned");
                return Vec::new();
            }
        }
    }
    pids.sort_unstable();
    pids
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_one_pid_per_line() {
        assert_eq!(parse_pid_lines("4242\n", 7001), vec![4242]);
        assert_eq!(parse_pid_lines("77\n12\n77\n", 7001), vec![12, 77]);
        assert!(parse_pid_lines("", 7001).is_empty());
    }

    #[test]
    fn garbage_means_no_owner() {
        assert!(parse_pid_lines("lsof: WARNING: can't stat()\n", 7001).is_empty());
        assert!(parse_pid_lines("4242\nnope\n", 7001).is_empty());
    }

    #[test]
    fn missing_binary_is_a_probe_failure() {
        let probe = LsofProbe::with_binary("/nonexistent/lsof");
        assert!(matches!(
            probe.listeners(7001),
            Err(SupervisorError::ProbeFailed(_))
        ));
    }
}
