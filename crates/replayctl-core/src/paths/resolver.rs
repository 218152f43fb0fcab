//! All replayer paths resolved in one place.
//!
//! Used by the CLI composition root, the `replayctl paths` command and the
//! asset stager so every component agrees on where things live.

use std::fmt;
use std::path::{Path, PathBuf};

use super::platform::{data_root, normalize_user_path, resource_root};
use super::PathError;

/// File name of the replayer shared library for this platform.
#[cfg(target_os = "macos")]
pub const REPLAYER_LIBRARY_NAME: &str = "libreplayer.dylib";

/// File name of the replayer shared library for this platform.
#[cfg(not(target_os = "macos"))]
pub const REPLAYER_LIBRARY_NAME: &str = "libreplayer.so";

/// Resolved directory layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPaths {
    /// Root directory for runtime data.
    pub data_root: PathBuf,
    /// Root directory for bundled resources.
    pub resource_root: PathBuf,
    /// Where the staged replayer library lives.
    pub replayer_dir: PathBuf,
    /// Where reports (and their static assets) are written.
    pub report_dir: PathBuf,
    /// Replayer log file used at trace verbosity.
    pub replayer_log: PathBuf,
    /// `.env` file with user overrides.
    pub env_file: PathBuf,
}

impl ResolvedPaths {
    /// Resolve from the environment, honoring an explicit `--data-dir`.
    pub fn resolve(data_dir_override: Option<&str>) -> Result<Self, PathError> {
        let data_root = match data_dir_override {
            Some(raw) => normalize_user_path(raw)?,
            None => data_root()?,
        };
        let resource_root = resource_root(&data_root)?;
        Ok(Self::from_roots(data_root, resource_root))
    }

    /// Lay out every path under the given roots (no environment access).
    pub fn from_roots(data_root: PathBuf, resource_root: PathBuf) -> Self {
        Self {
            replayer_dir: data_root.join("replayer"),
            report_dir: data_root.join("report"),
            replayer_log: data_root.join("logs").join("replayer.log"),
            env_file: data_root.join(".env"),
            data_root,
            resource_root,
        }
    }

    /// Staged library the replayer is preloaded from.
    pub fn staged_library(&self) -> PathBuf {
        self.replayer_dir.join(REPLAYER_LIBRARY_NAME)
    }

    /// Library shipped with the installation, copied on first start.
    pub fn bundled_library(&self) -> PathBuf {
        self.resource_root.join("lib").join(REPLAYER_LIBRARY_NAME)
    }

    /// Static report assets shipped with the installation.
    pub fn template_static_dir(&self) -> PathBuf {
        self.resource_root.join("templates").join("static")
    }

    /// Static report assets as used by generated reports.
    pub fn report_static_dir(&self) -> PathBuf {
        self.report_dir.join("static")
    }

    pub fn log_dir(&self) -> &Path {
        self.replayer_log.parent().unwrap_or(&self.data_root)
    }
}

impl fmt::Display for ResolvedPaths {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "data root:      {}", self.data_root.display())?;
        writeln!(f, "resource root:  {}", self.resource_root.display())?;
        writeln!(f, "replayer dir:   {}", self.replayer_dir.display())?;
        writeln!(f, "report dir:     {}", self.report_dir.display())?;
        writeln!(f, "replayer log:   {}", self.replayer_log.display())?;
        write!(f, "env file:       {}", self.env_file.display())
    }
}
