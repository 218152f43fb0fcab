//! CLI bootstrap - the composition root.
//!
//! This module is the ONLY place where infrastructure is wired together
//! for the CLI adapter:
//! - Resolved paths and the `.env` file under the data root
//! - Replayer settings (environment, then command-line overrides)
//! - The port owner probe (via replayctl-runtime)
//! - The exit hook registry shared with the supervisor

use std::path::PathBuf;
use std::sync::Arc;

use replayctl_core::{
    ExitHooks, LaunchOptions, PortOwnerProbe, ReplayerSettings, ResolvedPaths, Verbosity,
    build_launch_options,
};
use replayctl_runtime::{ReplayerSupervisor, default_probe};
use tracing::debug;

use crate::commands::LaunchArgs;
use crate::error::CliError;
use crate::parser::Cli;

/// Values given on the command line that override configured settings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SettingsOverrides {
    pub inbound_port: Option<u16>,
    pub outbound_port: Option<u16>,
    pub server_command: Option<String>,
    pub library: Option<PathBuf>,
}

impl SettingsOverrides {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            inbound_port: cli.inbound_port,
            outbound_port: cli.outbound_port,
            server_command: cli.server_command.clone(),
            library: cli.library.clone(),
        }
    }

    pub fn apply(self, mut settings: ReplayerSettings) -> ReplayerSettings {
        if let Some(port) = self.inbound_port {
            settings.inbound_port = port;
        }
        if let Some(port) = self.outbound_port {
            settings.outbound_port = port;
        }
        if let Some(command) = self.server_command {
            settings.server_command = Some(command);
        }
        if let Some(library) = self.library {
            settings.library_path = Some(library);
        }
        settings
    }
}

/// Bootstrap configuration for the CLI.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: Option<String>,
    pub overrides: SettingsOverrides,
    pub verbosity: Verbosity,
}

impl CliConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone(),
            overrides: SettingsOverrides::from_cli(cli),
            verbosity: cli.verbosity(),
        }
    }
}

/// Fully composed context for CLI commands.
pub struct CliContext {
    pub paths: ResolvedPaths,
    pub settings: ReplayerSettings,
    pub probe: Arc<dyn PortOwnerProbe>,
    pub hooks: ExitHooks,
    pub verbosity: Verbosity,
}

impl CliContext {
    /// Supervisor sharing this context's probe and exit hooks.
    pub fn supervisor(&self) -> ReplayerSupervisor {
        ReplayerSupervisor::builder(self.settings.clone(), Arc::clone(&self.probe))
            .with_exit_hooks(self.hooks.clone())
            .with_assets(self.paths.clone())
            .build()
    }

    pub fn launch_options(&self, args: &LaunchArgs) -> LaunchOptions {
        build_launch_options(
            &args.to_request(self.verbosity),
            &self.settings,
            &self.paths.replayer_log,
        )
    }
}

/// Resolve paths, load `.env` and settings, and pick a port probe.
pub fn bootstrap(config: CliConfig) -> Result<CliContext, CliError> {
    let paths = ResolvedPaths::resolve(config.data_dir.as_deref())?;

    // Variables already set in the environment win over the file.
    match dotenvy::from_path(&paths.env_file) {
        Ok(()) => debug!(path = %paths.env_file.display(), "Loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => {
            return Err(CliError::Config(format!(
                "failed to read {}: {e}",
                paths.env_file.display()
            )));
        }
    }

    let settings = resolve_settings(
        ReplayerSettings::from_env()?,
        config.overrides,
        &paths,
    );
    let probe = default_probe()?;

    Ok(CliContext {
        paths,
        settings,
        probe,
        hooks: ExitHooks::new(),
        verbosity: config.verbosity,
    })
}

/// Apply overrides, then default the library to the staged copy when the
/// installation ships one.
fn resolve_settings(
    configured: ReplayerSettings,
    overrides: SettingsOverrides,
    paths: &ResolvedPaths,
) -> ReplayerSettings {
    let mut settings = overrides.apply(configured);
    if settings.library_path.is_none()
        && (paths.bundled_library().is_file() || paths.staged_library().is_file())
    {
        settings.library_path = Some(paths.staged_library());
    }
    settings
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn layout() -> (tempfile::TempDir, ResolvedPaths) {
        let temp = tempfile::tempdir().unwrap();
        let paths = ResolvedPaths::from_roots(temp.path().join("data"), temp.path().join("res"));
        (temp, paths)
    }

    #[test]
    fn overrides_replace_configured_values() {
        let (_temp, paths) = layout();
        let configured = ReplayerSettings {
            server_command: Some("php -S 0:8080".into()),
            ..ReplayerSettings::default()
        };
        let overrides = SettingsOverrides {
            inbound_port: Some(7101),
            server_command: Some("php -S 0:9090".into()),
            ..SettingsOverrides::default()
        };

        let settings = resolve_settings(configured, overrides, &paths);
        assert_eq!(settings.inbound_port, 7101);
        assert_eq!(settings.outbound_port, replayctl_core::DEFAULT_OUTBOUND_PORT);
        assert_eq!(settings.server_command.as_deref(), Some("php -S 0:9090"));
        assert_eq!(settings.library_path, None);
    }

    #[test]
    fn bundled_library_becomes_the_default() {
        let (_temp, paths) = layout();
        fs::create_dir_all(paths.bundled_library().parent().unwrap()).unwrap();
        fs::write(paths.bundled_library(), b"ELF").unwrap();

        let settings = resolve_settings(
            ReplayerSettings::default(),
            SettingsOverrides::default(),
            &paths,
        );
        assert_eq!(settings.library_path, Some(paths.staged_library()));

        let explicit = SettingsOverrides {
            library: Some(PathBuf::from("/opt/libreplayer.so")),
            ..SettingsOverrides::default()
        };
        let settings = resolve_settings(ReplayerSettings::default(), explicit, &paths);
        assert_eq!(settings.library_path, Some(PathBuf::from("/opt/libreplayer.so")));
    }
}
