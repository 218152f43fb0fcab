//! Replayer settings and validation.
//!
//! Settings come from a flat string map so they can be fed from the
//! environment, a `.env` file or a config section alike. Keys use the
//! kebab-case names the replayer config has always used.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::domain::PortSet;
use crate::ports::SupervisorError;

/// Default inbound (traffic in) port.
pub const DEFAULT_INBOUND_PORT: u16 = 7001;

/// Default outbound (traffic out) port.
pub const DEFAULT_OUTBOUND_PORT: u16 = 7002;

/// Prefix of environment variables read by [`ReplayerSettings::from_env`].
pub const SETTINGS_ENV_PREFIX: &str = "REPLAYCTL_";

pub const KEY_INBOUND_READ_TIMEOUT: &str = "inbound-read-timeout";
pub const KEY_GC_GLOBAL_STATUS_TIMEOUT: &str = "gc-global-status-timeout";
pub const KEY_INBOUND_PORT: &str = "inbound-port";
pub const KEY_OUTBOUND_PORT: &str = "outbound-port";
pub const KEY_SERVER_COMMAND: &str = "server-command";
pub const KEY_LIBRARY_PATH: &str = "library-path";

/// Configuration for one supervised replayer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayerSettings {
    /// Command that runs the application under replay (the replayer library
    /// is injected into it).
    pub server_command: Option<String>,

    /// Replayer shared library to preload. `None` runs the command as-is.
    pub library_path: Option<PathBuf>,

    /// Port the replayer accepts recorded inbound traffic on.
    pub inbound_port: u16,

    /// Port the replayer serves mocked outbound calls on.
    pub outbound_port: u16,

    /// Replayer inbound read timeout, passed through verbatim (e.g. `5s`).
    pub inbound_read_timeout: Option<String>,

    /// Replayer GC global-status timeout, passed through verbatim.
    pub gc_global_status_timeout: Option<String>,
}

impl Default for ReplayerSettings {
    fn default() -> Self {
        Self {
            server_command: None,
            library_path: None,
            inbound_port: DEFAULT_INBOUND_PORT,
            outbound_port: DEFAULT_OUTBOUND_PORT,
            inbound_read_timeout: None,
            gc_global_status_timeout: None,
        }
    }
}

impl ReplayerSettings {
    /// Build settings from a config map. Unknown keys are ignored and blank
    /// values count as unset.
    pub fn from_map(map: &HashMap<String, String>) -> Result<Self, SupervisorError> {
        let value = |key: &str| {
            map.get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let mut settings = Self {
            server_command: value(KEY_SERVER_COMMAND),
            library_path: value(KEY_LIBRARY_PATH).map(PathBuf::from),
            inbound_read_timeout: value(KEY_INBOUND_READ_TIMEOUT),
            gc_global_status_timeout: value(KEY_GC_GLOBAL_STATUS_TIMEOUT),
            ..Self::default()
        };

        if let Some(port) = value(KEY_INBOUND_PORT) {
            settings.inbound_port = parse_port(KEY_INBOUND_PORT, &port)?;
        }
        if let Some(port) = value(KEY_OUTBOUND_PORT) {
            settings.outbound_port = parse_port(KEY_OUTBOUND_PORT, &port)?;
        }

        Ok(settings)
    }

    /// Build settings from `REPLAYCTL_*` variables of the given environment.
    ///
    /// `REPLAYCTL_INBOUND_READ_TIMEOUT` maps to `inbound-read-timeout`, and so on.
    pub fn from_env_vars(
        vars: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, SupervisorError> {
        let map: HashMap<String, String> = vars
            .into_iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(SETTINGS_ENV_PREFIX)
                    .map(|rest| (rest.to_ascii_lowercase().replace('_', "-"), value))
            })
            .collect();
        Self::from_map(&map)
    }

    /// Build settings from the process environment.
    pub fn from_env() -> Result<Self, SupervisorError> {
        Self::from_env_vars(std::env::vars())
    }

    /// Ports the replayer binds.
    pub fn port_set(&self) -> PortSet {
        PortSet::inbound_outbound(self.inbound_port, self.outbound_port)
    }

    /// The server command, or a configuration error if none is set.
    pub fn require_server_command(&self) -> Result<&str, SupervisorError> {
        self.server_command.as_deref().ok_or_else(|| {
            SupervisorError::Configuration(format!(
                "no server command configured (set {SETTINGS_ENV_PREFIX}SERVER_COMMAND or --server-command)"
            ))
        })
    }

    pub fn validate(&self) -> Result<(), SupervisorError> {
        if self.inbound_port == 0 || self.outbound_port == 0 {
            return Err(SupervisorError::Configuration(
                "replayer ports must be non-zero".to_string(),
            ));
        }
        if self.inbound_port == self.outbound_port {
            return Err(SupervisorError::Configuration(format!(
                "inbound and outbound ports must differ (both are {})",
                self.inbound_port
            )));
        }
        self.require_server_command()?;
        Ok(())
    }
}

fn parse_port(key: &str, raw: &str) -> Result<u16, SupervisorError> {
    raw.parse::<u16>()
        .map_err(|e| SupervisorError::Configuration(format!("invalid {key} '{raw}': {e}")))
}
